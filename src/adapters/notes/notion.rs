//! Notion database backend.
//!
//! Notes are upserted by title: a page whose title equals the recipe name is
//! rewritten in place, otherwise a new page is created.

use crate::config::{LabelKey, LocaleStrings, LocaleTable, NotesConfig};
use crate::core::{EnrichedRecipe, NotesApp};
use crate::utils::error::{RecipeError, Result};
use crate::utils::validation::required_string;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::{json, Map, Value};

pub const NOTION_BASE_URL: &str = "https://api.notion.com/v1";
pub const NOTION_VERSION: &str = "2022-06-28";

const MAX_TEXT_LEN: usize = 2000;
const MAX_CHILDREN_PER_REQUEST: usize = 100;

pub struct NotionNotesApp {
    token: String,
    base_url: String,
    database_id: String,
    title_property: String,
    domain_property: bool,
    labels: LocaleStrings,
    client: Client,
}

impl NotionNotesApp {
    pub fn new(token: String, database_id: String, labels: LocaleStrings) -> Self {
        Self {
            token,
            base_url: NOTION_BASE_URL.to_string(),
            database_id,
            title_property: "Name".to_string(),
            domain_property: true,
            labels,
            client: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_title_property(mut self, title_property: &str) -> Self {
        self.title_property = title_property.to_string();
        self
    }

    pub fn with_domain_property(mut self, enabled: bool) -> Self {
        self.domain_property = enabled;
        self
    }

    /// Builds the backend from configuration, resolving the database by name
    /// when no id is configured.
    pub async fn connect(config: &NotesConfig, locale: &LocaleTable) -> Result<Self> {
        let token = required_string("notes.token (NOTION_TOKEN)", &config.token)?;
        let labels = locale.strings(&config.language)?.clone();

        let mut app = Self::new(token, String::new(), labels)
            .with_title_property(&config.title_property)
            .with_domain_property(config.domain_property);
        if let Some(base_url) = &config.base_url {
            app = app.with_base_url(base_url);
        }

        let database_id = match config.database_id.as_deref().filter(|id| !id.trim().is_empty()) {
            Some(id) => id.to_string(),
            None => {
                let name = required_string(
                    "notes.database_name (NOTION_DATABASE_NAME)",
                    &config.database_name,
                )?;
                app.find_database(&name).await?
            }
        };
        app.database_id = database_id;

        tracing::info!(
            "Notion notes ready (database {}, language {})",
            app.database_id,
            config.language
        );
        Ok(app)
    }

    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await.map_err(|e| write_error(e.to_string()))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| write_error(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v["message"].as_str().map(str::to_string))
                .unwrap_or(body);
            return Err(write_error(format!("status {}: {}", status, message)));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn find_database(&self, name: &str) -> Result<String> {
        let request = self.request(Method::POST, "/search").json(&json!({
            "query": name,
            "filter": {"property": "object", "value": "database"}
        }));
        let result = self.send(request).await.map_err(|e| RecipeError::ConfigError {
            message: format!("Could not look up Notion database '{}': {}", name, e),
        })?;

        first_result_id(&result).ok_or_else(|| RecipeError::ConfigError {
            message: format!("Database with name {} not found", name),
        })
    }

    /// Id of a page with the given title; lookup failures count as "not found".
    async fn find_page(&self, page_name: &str) -> Option<String> {
        let request = self
            .request(
                Method::POST,
                &format!("/databases/{}/query", self.database_id),
            )
            .json(&json!({
                "filter": {
                    "property": self.title_property,
                    "title": {"equals": page_name}
                }
            }));

        match self.send(request).await {
            Ok(result) => first_result_id(&result),
            Err(e) => {
                tracing::error!("Failed to check if page exists: {}", e);
                None
            }
        }
    }

    fn page_name(&self, recipe: &EnrichedRecipe) -> String {
        recipe
            .recipe
            .name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.labels.get(LabelKey::UntitledRecipe).to_string())
    }

    fn page_properties(&self, recipe: &EnrichedRecipe) -> Value {
        let mut properties = Map::new();
        properties.insert(
            self.title_property.clone(),
            json!({"title": rich_text(&self.page_name(recipe))}),
        );
        properties.insert(
            self.labels.get(LabelKey::Url).to_string(),
            json!({"url": recipe.url}),
        );
        if self.domain_property {
            properties.insert(
                self.labels.get(LabelKey::Domain).to_string(),
                json!({"rich_text": rich_text(&recipe.domain)}),
            );
        }
        Value::Object(properties)
    }

    fn page_content(&self, recipe: &EnrichedRecipe) -> Vec<Value> {
        let recipe = &recipe.recipe;
        let mut children = Vec::new();

        if let Some(ingredients) = recipe.ingredients.as_ref().filter(|i| !i.is_empty()) {
            children.push(block("heading_2", self.labels.get(LabelKey::Ingredients)));
            children.extend(
                ingredients
                    .iter()
                    .map(|ingredient| block("bulleted_list_item", ingredient)),
            );
        }

        if let Some(time) = recipe
            .cooking_time_temperature
            .as_ref()
            .filter(|t| !t.trim().is_empty())
        {
            children.push(block(
                "heading_2",
                self.labels.get(LabelKey::CookingTimeTemperature),
            ));
            children.push(block("paragraph", time));
        }

        if let Some(instructions) = recipe.instructions.as_ref().filter(|i| !i.is_empty()) {
            children.push(block("heading_2", self.labels.get(LabelKey::Instructions)));
            children.extend(
                instructions
                    .iter()
                    .map(|step| block("numbered_list_item", step)),
            );
        }

        if let Some(hints) = recipe.hints.as_ref().filter(|h| !h.trim().is_empty()) {
            children.push(block("heading_2", self.labels.get(LabelKey::Hints)));
            children.push(block("paragraph", hints));
        }

        children
    }

    async fn append_children(&self, block_id: &str, children: &[Value]) -> Result<()> {
        for batch in children.chunks(MAX_CHILDREN_PER_REQUEST) {
            let request = self
                .request(Method::PATCH, &format!("/blocks/{}/children", block_id))
                .json(&json!({"children": batch}));
            self.send(request).await?;
        }
        Ok(())
    }

    async fn create_page(&self, recipe: &EnrichedRecipe) -> Result<String> {
        let children = self.page_content(recipe);
        let (first, rest) = children.split_at(children.len().min(MAX_CHILDREN_PER_REQUEST));

        let mut body = json!({
            "parent": {"database_id": self.database_id},
            "properties": self.page_properties(recipe),
            "children": first,
        });
        if let Some(cover) = page_cover(recipe) {
            body["cover"] = cover;
        }

        let page = self
            .send(self.request(Method::POST, "/pages").json(&body))
            .await?;
        let page_id = page["id"]
            .as_str()
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or_else(|| write_error("created page has no id".to_string()))?;

        if !rest.is_empty() {
            self.append_children(&page_id, rest).await?;
        }

        tracing::info!("Successfully created Notion page: {}", page_id);
        Ok(page_id)
    }

    async fn existing_block_ids(&self, page_id: &str) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut request = self
                .request(Method::GET, &format!("/blocks/{}/children", page_id))
                .query(&[("page_size", "100")]);
            if let Some(cursor) = &cursor {
                request = request.query(&[("start_cursor", cursor.as_str())]);
            }
            let listing = self.send(request).await?;

            if let Some(results) = listing["results"].as_array() {
                ids.extend(
                    results
                        .iter()
                        .filter_map(|block| block["id"].as_str().map(str::to_string)),
                );
            }

            match listing["next_cursor"].as_str() {
                Some(next) if listing["has_more"].as_bool().unwrap_or(false) => {
                    cursor = Some(next.to_string())
                }
                _ => break,
            }
        }

        Ok(ids)
    }

    async fn update_page(&self, page_id: &str, recipe: &EnrichedRecipe) -> Result<String> {
        let mut body = json!({"properties": self.page_properties(recipe)});
        if let Some(cover) = page_cover(recipe) {
            body["cover"] = cover;
        }
        self.send(
            self.request(Method::PATCH, &format!("/pages/{}", page_id))
                .json(&body),
        )
        .await?;

        for block_id in self.existing_block_ids(page_id).await? {
            self.send(self.request(Method::DELETE, &format!("/blocks/{}", block_id)))
                .await?;
        }

        let children = self.page_content(recipe);
        if !children.is_empty() {
            self.append_children(page_id, &children).await?;
        }

        tracing::info!("Successfully updated Notion page: {}", page_id);
        Ok(page_id.to_string())
    }

    /// Creates or rewrites the page for `recipe` and returns its id.
    pub async fn upsert_page(&self, recipe: &EnrichedRecipe) -> Result<String> {
        let page_name = self.page_name(recipe);
        match self.find_page(&page_name).await {
            Some(page_id) => {
                tracing::info!(
                    "Updating existing page '{}' with ID: {}",
                    page_name,
                    page_id
                );
                self.update_page(&page_id, recipe).await
            }
            None => {
                tracing::info!("Creating new page '{}'", page_name);
                self.create_page(recipe).await
            }
        }
    }
}

#[async_trait]
impl NotesApp for NotionNotesApp {
    async fn create_note(&self, recipe: EnrichedRecipe) -> Result<()> {
        if recipe.url.trim().is_empty() || recipe.domain.trim().is_empty() {
            return Err(RecipeError::ValidationError {
                message: "enriched recipe needs both url and domain".to_string(),
            });
        }
        self.upsert_page(&recipe).await.map(|_| ())
    }
}

fn write_error(message: String) -> RecipeError {
    RecipeError::NotesWriteError {
        backend: "notion".to_string(),
        message,
    }
}

fn first_result_id(result: &Value) -> Option<String> {
    result["results"]
        .as_array()
        .and_then(|results| results.first())
        .and_then(|item| item["id"].as_str())
        .map(str::to_string)
}

fn page_cover(recipe: &EnrichedRecipe) -> Option<Value> {
    recipe
        .recipe
        .image_url
        .as_ref()
        .filter(|url| !url.trim().is_empty())
        .map(|url| json!({"type": "external", "external": {"url": url}}))
}

/// Rich-text array, split into segments Notion accepts.
fn rich_text(content: &str) -> Value {
    let chars: Vec<char> = content.chars().collect();
    let segments: Vec<Value> = chars
        .chunks(MAX_TEXT_LEN)
        .map(|chunk| {
            json!({
                "type": "text",
                "text": {"content": chunk.iter().collect::<String>()}
            })
        })
        .collect();
    Value::Array(segments)
}

fn block(kind: &str, content: &str) -> Value {
    let mut inner = Map::new();
    inner.insert("rich_text".to_string(), rich_text(content));

    let mut block = Map::new();
    block.insert("object".to_string(), json!("block"));
    block.insert("type".to_string(), json!(kind));
    block.insert(kind.to_string(), Value::Object(inner));
    Value::Object(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Recipe;
    use httpmock::prelude::*;
    use httpmock::Method::PATCH;

    fn labels(code: &str) -> LocaleStrings {
        LocaleTable::builtin().unwrap().strings(code).unwrap().clone()
    }

    fn pie() -> EnrichedRecipe {
        EnrichedRecipe::from_recipe(
            Recipe {
                name: Some("Apple Pie".to_string()),
                ingredients: Some(vec!["2 apples".to_string(), "1 cup sugar".to_string()]),
                cooking_time_temperature: Some("45 min, 180°C".to_string()),
                instructions: Some(vec!["Mix".to_string(), "Bake".to_string()]),
                hints: Some("Serve warm".to_string()),
                image_url: Some("https://cooking.example/pie.jpg".to_string()),
            },
            "https://cooking.example/pie",
        )
        .unwrap()
    }

    #[test]
    fn test_page_content_uses_localized_headings() {
        let app = NotionNotesApp::new("t".to_string(), "db".to_string(), labels("pl"));
        let children = app.page_content(&pie());

        // 4 headings, 2 ingredients, 1 time paragraph, 2 steps, 1 hint paragraph
        assert_eq!(children.len(), 10);
        assert_eq!(children[0]["type"], "heading_2");
        assert_eq!(
            children[0]["heading_2"]["rich_text"][0]["text"]["content"],
            "Składniki"
        );
        assert_eq!(children[1]["type"], "bulleted_list_item");
        assert_eq!(children[6]["type"], "numbered_list_item");
        assert_eq!(
            children[8]["heading_2"]["rich_text"][0]["text"]["content"],
            "Wskazówki"
        );
    }

    #[test]
    fn test_empty_recipe_has_no_content_and_untitled_name() {
        let app = NotionNotesApp::new("t".to_string(), "db".to_string(), labels("en"));
        let recipe =
            EnrichedRecipe::from_recipe(Recipe::default(), "https://cooking.example/x").unwrap();

        assert!(app.page_content(&recipe).is_empty());
        let properties = app.page_properties(&recipe);
        assert_eq!(
            properties["Name"]["title"][0]["text"]["content"],
            "Untitled Recipe"
        );
        assert_eq!(properties["Recipe URL"]["url"], "https://cooking.example/x");
        assert_eq!(
            properties["Domain"]["rich_text"][0]["text"]["content"],
            "cooking.example"
        );
        assert!(page_cover(&recipe).is_none());
    }

    #[test]
    fn test_domain_property_can_be_turned_off() {
        let app = NotionNotesApp::new("t".to_string(), "db".to_string(), labels("pl"))
            .with_domain_property(false);
        let properties = app.page_properties(&pie());
        let properties = properties.as_object().unwrap();

        assert_eq!(properties.len(), 2);
        assert!(properties.contains_key("Name"));
        assert!(!properties.contains_key("Strona"));
    }

    #[test]
    fn test_long_text_is_split() {
        let text = "a".repeat(MAX_TEXT_LEN * 2 + 5);
        let segments = rich_text(&text);
        let segments = segments.as_array().unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(
            segments[2]["text"]["content"].as_str().unwrap().len(),
            5
        );
    }

    #[tokio::test]
    async fn test_create_note_creates_page_when_missing() {
        let server = MockServer::start();
        let query_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/databases/db-1/query")
                .header("notion-version", NOTION_VERSION)
                .json_body_partial(
                    r#"{"filter": {"property": "Name", "title": {"equals": "Apple Pie"}}}"#,
                );
            then.status(200).json_body(json!({"results": []}));
        });
        let create_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/pages")
                .header("authorization", "Bearer secret")
                .json_body_partial(
                    r#"{"parent": {"database_id": "db-1"}, "cover": {"type": "external", "external": {"url": "https://cooking.example/pie.jpg"}}}"#,
                )
                .body_contains("1 cup sugar");
            then.status(200).json_body(json!({"object": "page", "id": "page-1"}));
        });

        let app = NotionNotesApp::new("secret".to_string(), "db-1".to_string(), labels("en"))
            .with_base_url(&server.base_url());
        app.create_note(pie()).await.unwrap();

        query_mock.assert();
        create_mock.assert();
    }

    #[tokio::test]
    async fn test_create_note_rewrites_existing_page() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/databases/db-1/query");
            then.status(200)
                .json_body(json!({"results": [{"object": "page", "id": "page-7"}]}));
        });
        let update_mock = server.mock(|when, then| {
            when.method(PATCH)
                .path("/pages/page-7")
                .json_body_partial(r#"{"properties": {"Recipe URL": {"url": "https://cooking.example/pie"}}}"#);
            then.status(200).json_body(json!({"object": "page", "id": "page-7"}));
        });
        let list_mock = server.mock(|when, then| {
            when.method(GET).path("/blocks/page-7/children");
            then.status(200).json_body(json!({
                "results": [{"id": "block-a"}, {"id": "block-b"}],
                "has_more": false,
                "next_cursor": null
            }));
        });
        let delete_a = server.mock(|when, then| {
            when.method(DELETE).path("/blocks/block-a");
            then.status(200).json_body(json!({"id": "block-a", "archived": true}));
        });
        let delete_b = server.mock(|when, then| {
            when.method(DELETE).path("/blocks/block-b");
            then.status(200).json_body(json!({"id": "block-b", "archived": true}));
        });
        let append_mock = server.mock(|when, then| {
            when.method(PATCH)
                .path("/blocks/page-7/children")
                .body_contains("Serve warm");
            then.status(200).json_body(json!({"results": []}));
        });

        let app = NotionNotesApp::new("secret".to_string(), "db-1".to_string(), labels("en"))
            .with_base_url(&server.base_url());
        let page_id = app.upsert_page(&pie()).await.unwrap();

        assert_eq!(page_id, "page-7");
        update_mock.assert();
        list_mock.assert();
        delete_a.assert();
        delete_b.assert();
        append_mock.assert();
    }

    #[tokio::test]
    async fn test_rejected_write_is_notes_write_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/databases/db-1/query");
            then.status(200).json_body(json!({"results": []}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/pages");
            then.status(400).json_body(json!({
                "object": "error",
                "status": 400,
                "code": "validation_error",
                "message": "Recipe URL is not a property that exists."
            }));
        });

        let app = NotionNotesApp::new("secret".to_string(), "db-1".to_string(), labels("en"))
            .with_base_url(&server.base_url());
        let result = app.create_note(pie()).await;

        match result {
            Err(RecipeError::NotesWriteError { backend, message }) => {
                assert_eq!(backend, "notion");
                assert!(message.contains("not a property that exists"));
            }
            other => panic!("expected NotesWriteError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_response_without_id_is_notes_write_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/databases/db-1/query");
            then.status(200).json_body(json!({"results": []}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/pages");
            then.status(200).json_body(json!({"object": "page"}));
        });
        let append_mock = server.mock(|when, then| {
            when.method(PATCH).path_contains("/children");
            then.status(200).json_body(json!({"results": []}));
        });

        let app = NotionNotesApp::new("secret".to_string(), "db-1".to_string(), labels("en"))
            .with_base_url(&server.base_url());
        let result = app.create_note(pie()).await;

        assert!(matches!(result, Err(RecipeError::NotesWriteError { .. })));
        append_mock.assert_hits(0);
    }

    #[tokio::test]
    async fn test_block_listing_follows_encoded_cursor() {
        let server = MockServer::start();
        // Matched in definition order: the cursor request hits the first mock.
        let second_page = server.mock(|when, then| {
            when.method(GET)
                .path("/blocks/page-9/children")
                .query_param("start_cursor", "cur/2+&x=1");
            then.status(200).json_body(json!({
                "results": [{"id": "block-b"}],
                "has_more": false,
                "next_cursor": null
            }));
        });
        let first_page = server.mock(|when, then| {
            when.method(GET)
                .path("/blocks/page-9/children")
                .query_param("page_size", "100");
            then.status(200).json_body(json!({
                "results": [{"id": "block-a"}],
                "has_more": true,
                "next_cursor": "cur/2+&x=1"
            }));
        });

        let app = NotionNotesApp::new("secret".to_string(), "db-1".to_string(), labels("en"))
            .with_base_url(&server.base_url());
        let ids = app.existing_block_ids("page-9").await.unwrap();

        first_page.assert();
        second_page.assert();
        assert_eq!(ids, vec!["block-a".to_string(), "block-b".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_lookup_falls_back_to_create() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/databases/db-1/query");
            then.status(502).body("bad gateway");
        });
        let create_mock = server.mock(|when, then| {
            when.method(POST).path("/pages");
            then.status(200).json_body(json!({"id": "page-2"}));
        });

        let app = NotionNotesApp::new("secret".to_string(), "db-1".to_string(), labels("en"))
            .with_base_url(&server.base_url());
        assert_eq!(app.upsert_page(&pie()).await.unwrap(), "page-2");
        create_mock.assert();
    }

    #[tokio::test]
    async fn test_missing_url_is_rejected() {
        let app = NotionNotesApp::new("secret".to_string(), "db-1".to_string(), labels("en"));
        let recipe = EnrichedRecipe {
            recipe: Recipe::default(),
            url: String::new(),
            domain: String::new(),
        };
        assert!(matches!(
            app.create_note(recipe).await,
            Err(RecipeError::ValidationError { .. })
        ));
    }

    #[tokio::test]
    async fn test_connect_resolves_database_by_name() {
        let server = MockServer::start();
        let search_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/search")
                .json_body_partial(r#"{"query": "Recipes", "filter": {"value": "database"}}"#);
            then.status(200)
                .json_body(json!({"results": [{"object": "database", "id": "db-found"}]}));
        });

        let config = NotesConfig {
            token: Some("secret".to_string()),
            database_name: Some("Recipes".to_string()),
            base_url: Some(server.base_url()),
            language: "pl".to_string(),
            ..Default::default()
        };
        let app = NotionNotesApp::connect(&config, &LocaleTable::builtin().unwrap())
            .await
            .unwrap();

        search_mock.assert();
        assert_eq!(app.database_id(), "db-found");
    }

    #[tokio::test]
    async fn test_connect_unknown_database_is_config_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/search");
            then.status(200).json_body(json!({"results": []}));
        });

        let config = NotesConfig {
            token: Some("secret".to_string()),
            database_name: Some("Nope".to_string()),
            base_url: Some(server.base_url()),
            ..Default::default()
        };
        let result = NotionNotesApp::connect(&config, &LocaleTable::builtin().unwrap()).await;

        assert!(matches!(result, Err(RecipeError::ConfigError { .. })));
    }

    #[tokio::test]
    async fn test_connect_unsupported_language_fails() {
        let config = NotesConfig {
            token: Some("secret".to_string()),
            database_id: Some("db-1".to_string()),
            language: "fr".to_string(),
            ..Default::default()
        };
        let result = NotionNotesApp::connect(&config, &LocaleTable::builtin().unwrap()).await;

        assert!(matches!(
            result,
            Err(RecipeError::UnsupportedLanguageError { .. })
        ));
    }
}
