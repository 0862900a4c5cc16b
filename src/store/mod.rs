//! Saved recipes, custom chefs, and profiles in the hosted document store

pub mod value;

use std::collections::BTreeMap;
use std::time::Duration;

use crate::auth::AuthSession;
use crate::persona::{Persona, PersonaId};
use crate::recipe::Recipe;
use crate::{Error, Result};

pub use value::{Fields, Value};

const FIRESTORE_BASE: &str = "https://firestore.googleapis.com/v1";

/// Account profile fields used for dietary-aware generation
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Profile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    /// e.g. "vegetarian", folded into generation prompts
    pub dietary: Option<String>,
    /// e.g. "peanuts, shellfish", folded into generation prompts
    pub allergies: Option<String>,
}

#[derive(serde::Serialize)]
struct WriteRequest {
    fields: Fields,
}

#[derive(serde::Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Fields,
}

#[derive(serde::Deserialize)]
struct ListResponse {
    #[serde(default)]
    documents: Vec<Document>,
}

/// Per-account document CRUD over the Firestore REST API
///
/// Documents live under `users/{uid}`: the user document itself holds
/// the profile, with `recipes` and `chefs` subcollections.
pub struct StoreClient {
    client: reqwest::Client,
    project_id: String,
}

impl StoreClient {
    /// Create a store client for one Firebase project
    ///
    /// # Errors
    ///
    /// Returns error if the project id is missing or the HTTP client
    /// cannot be built
    pub fn new(project_id: String, timeout: Duration) -> Result<Self> {
        if project_id.is_empty() {
            return Err(Error::Config("Firebase project id required".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self { client, project_id })
    }

    /// Save a recipe under its title slug, overwriting any previous save
    ///
    /// # Errors
    ///
    /// Returns error if the write fails
    pub async fn save_recipe(&self, session: &AuthSession, recipe: &Recipe) -> Result<()> {
        let slug = recipe.slug();
        if slug.is_empty() {
            return Err(Error::Store("recipe has no title to save under".to_string()));
        }

        let path = format!("users/{}/recipes/{slug}", session.uid);
        self.write_document(session, &path, recipe_fields(recipe), None)
            .await?;

        tracing::info!(slug = %slug, "recipe saved");
        Ok(())
    }

    /// List all saved recipes
    ///
    /// # Errors
    ///
    /// Returns error if the read fails
    pub async fn list_recipes(&self, session: &AuthSession) -> Result<Vec<Recipe>> {
        let path = format!("users/{}/recipes", session.uid);
        let documents = self.list_documents(session, &path).await?;
        Ok(documents
            .iter()
            .map(|doc| recipe_from_fields(&doc.fields))
            .collect())
    }

    /// Set the rating on a saved recipe, leaving other fields alone
    ///
    /// # Errors
    ///
    /// Returns error if the recipe is not saved or the write fails
    pub async fn rate_recipe(&self, session: &AuthSession, slug: &str, rating: u8) -> Result<()> {
        if !(1..=5).contains(&rating) {
            return Err(Error::Store(format!("rating {rating} out of range 1-5")));
        }

        let path = format!("users/{}/recipes/{slug}", session.uid);
        let mut fields = Fields::new();
        fields.insert("rating".to_string(), Value::integer(i64::from(rating)));
        self.write_document(session, &path, fields, Some(&["rating"]))
            .await?;

        tracing::info!(slug = %slug, rating, "recipe rated");
        Ok(())
    }

    /// Save a custom chef so it survives across sessions
    ///
    /// # Errors
    ///
    /// Returns error if the write fails
    pub async fn save_chef(&self, session: &AuthSession, persona: &Persona) -> Result<()> {
        let PersonaId::Custom(id) = &persona.id else {
            return Err(Error::Store("built-in chefs are not saved".to_string()));
        };

        let path = format!("users/{}/chefs/{id}", session.uid);
        let mut fields = Fields::new();
        fields.insert("name".to_string(), Value::string(&persona.name));
        fields.insert("voice_id".to_string(), Value::string(&persona.voice_id));
        fields.insert("prompt".to_string(), Value::string(&persona.prompt));
        self.write_document(session, &path, fields, None).await?;

        tracing::info!(chef = %persona.name, "custom chef saved");
        Ok(())
    }

    /// List saved custom chefs
    ///
    /// # Errors
    ///
    /// Returns error if the read fails
    pub async fn list_chefs(&self, session: &AuthSession) -> Result<Vec<Persona>> {
        let path = format!("users/{}/chefs", session.uid);
        let documents = self.list_documents(session, &path).await?;
        Ok(documents
            .iter()
            .map(|doc| {
                let field = |key: &str| {
                    doc.fields
                        .get(key)
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string()
                };
                Persona::custom(document_id(&doc.name), field("name"), field("voice_id"), field("prompt"))
            })
            .collect())
    }

    /// Create or replace the account profile document
    ///
    /// # Errors
    ///
    /// Returns error if the write fails
    pub async fn create_profile(&self, session: &AuthSession, profile: &Profile) -> Result<()> {
        let path = format!("users/{}", session.uid);
        self.write_document(session, &path, profile_fields(profile), None)
            .await?;
        tracing::info!("profile created");
        Ok(())
    }

    /// Fetch the account profile, if one exists
    ///
    /// # Errors
    ///
    /// Returns error if the read fails for reasons other than absence
    pub async fn get_profile(&self, session: &AuthSession) -> Result<Option<Profile>> {
        let url = self.document_url(&format!("users/{}", session.uid));
        let response = self
            .client
            .get(&url)
            .bearer_auth(&session.id_token)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Store(format!("profile read failed {status}: {body}")));
        }

        let doc: Document = response.json().await?;
        Ok(Some(profile_from_fields(&doc.fields)))
    }

    /// Update dietary preferences without touching the rest of the profile
    ///
    /// # Errors
    ///
    /// Returns error if the write fails
    pub async fn update_preferences(
        &self,
        session: &AuthSession,
        dietary: Option<&str>,
        allergies: Option<&str>,
    ) -> Result<()> {
        let mut fields = Fields::new();
        let mut mask = Vec::new();
        if let Some(dietary) = dietary {
            fields.insert("dietary".to_string(), Value::string(dietary));
            mask.push("dietary");
        }
        if let Some(allergies) = allergies {
            fields.insert("allergies".to_string(), Value::string(allergies));
            mask.push("allergies");
        }
        if mask.is_empty() {
            return Ok(());
        }

        let path = format!("users/{}", session.uid);
        self.write_document(session, &path, fields, Some(&mask)).await?;

        tracing::info!("preferences updated");
        Ok(())
    }

    async fn write_document(
        &self,
        session: &AuthSession,
        path: &str,
        fields: Fields,
        update_mask: Option<&[&str]>,
    ) -> Result<()> {
        let mut url = self.document_url(path);
        if let Some(mask) = update_mask {
            let params: Vec<String> = mask
                .iter()
                .map(|f| format!("updateMask.fieldPaths={}", urlencoding::encode(f)))
                .collect();
            url = format!("{url}?{}", params.join("&"));
        }

        let response = self
            .client
            .patch(&url)
            .bearer_auth(&session.id_token)
            .json(&WriteRequest { fields })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, path = %path, "document write failed");
            return Err(Error::Store(format!("write failed {status}: {body}")));
        }

        Ok(())
    }

    async fn list_documents(&self, session: &AuthSession, path: &str) -> Result<Vec<Document>> {
        let url = self.document_url(path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&session.id_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Store(format!("list failed {status}: {body}")));
        }

        let list: ListResponse = response.json().await?;
        Ok(list.documents)
    }

    fn document_url(&self, path: &str) -> String {
        format!(
            "{FIRESTORE_BASE}/projects/{}/databases/(default)/documents/{path}",
            self.project_id
        )
    }
}

/// Last path segment of a full document resource name
fn document_id(name: &str) -> String {
    name.rsplit('/').next().unwrap_or_default().to_string()
}

fn recipe_fields(recipe: &Recipe) -> Fields {
    let mut fields = BTreeMap::new();
    fields.insert("title".to_string(), Value::string(&recipe.title));
    fields.insert("description".to_string(), Value::string(&recipe.description));
    fields.insert(
        "ingredients".to_string(),
        Value::array(recipe.ingredients.iter().cloned()),
    );
    fields.insert("steps".to_string(), Value::array(recipe.steps.iter().cloned()));
    if let Some(url) = &recipe.image_url {
        fields.insert("image_url".to_string(), Value::string(url));
    }
    if let Some(rating) = recipe.rating {
        fields.insert("rating".to_string(), Value::integer(i64::from(rating)));
    }
    fields.insert("saved_at".to_string(), Value::timestamp(chrono::Utc::now()));
    fields
}

fn recipe_from_fields(fields: &Fields) -> Recipe {
    let text = |key: &str| {
        fields
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let list = |key: &str| {
        fields
            .get(key)
            .and_then(Value::as_string_array)
            .unwrap_or_default()
    };

    Recipe {
        title: text("title"),
        description: text("description"),
        ingredients: list("ingredients"),
        steps: list("steps"),
        image_url: fields
            .get("image_url")
            .and_then(Value::as_str)
            .map(ToString::to_string),
        rating: fields
            .get("rating")
            .and_then(Value::as_i64)
            .and_then(|n| u8::try_from(n).ok()),
    }
}

fn profile_fields(profile: &Profile) -> Fields {
    let mut fields = BTreeMap::new();
    let mut put = |key: &str, value: &Option<String>| {
        if let Some(value) = value {
            fields.insert(key.to_string(), Value::string(value));
        }
    };
    put("name", &profile.name);
    put("email", &profile.email);
    put("bio", &profile.bio);
    put("dietary", &profile.dietary);
    put("allergies", &profile.allergies);
    fields
}

fn profile_from_fields(fields: &Fields) -> Profile {
    let text = |key: &str| {
        fields
            .get(key)
            .and_then(Value::as_str)
            .map(ToString::to_string)
    };
    Profile {
        name: text("name"),
        email: text("email"),
        bio: text("bio"),
        dietary: text("dietary"),
        allergies: text("allergies"),
    }
}
