//! Player skins for player heads.
//!
//! A `profile` component is a player name, or an object with `name`, `id`
//! and `properties`. The `textures` property is Base64 JSON whose
//! `textures.SKIN.url` points at the skin PNG.

use crate::error::{RenderError, Result};
use crate::resource_pack::TextureData;
use base64::Engine;
use serde_json::Value;

/// Texture used when a player head has no resolvable skin.
pub const STEVE_TEXTURE: &str = "minecraft:entity/player/wide/steve";

/// Resolves a `profile` component to a skin image.
pub trait ProfileResolver {
    /// `Ok(None)` means the profile has no skin and the default is used.
    fn fetch_skin(&self, profile: &Value) -> Result<Option<TextureData>>;
}

/// Player name of a profile component.
pub fn profile_name(profile: &Value) -> Option<&str> {
    match profile {
        Value::String(name) => Some(name),
        other => other.get("name").and_then(Value::as_str),
    }
}

/// Undashed hex UUID of a profile component. Accepts the int-array form.
pub fn profile_id(profile: &Value) -> Option<String> {
    match profile.get("id")? {
        Value::String(id) => Some(id.replace('-', "").to_lowercase()),
        Value::Array(parts) if parts.len() == 4 => {
            let mut out = String::with_capacity(32);
            for part in parts {
                let word = part.as_i64()? as i32 as u32;
                out.push_str(&format!("{:08x}", word));
            }
            Some(out)
        }
        _ => None,
    }
}

/// The Base64 `textures` property value, if the profile carries one.
pub fn textures_property(profile: &Value) -> Option<&str> {
    profile
        .get("properties")?
        .as_array()?
        .iter()
        .find(|p| p.get("name").and_then(Value::as_str) == Some("textures"))?
        .get("value")?
        .as_str()
}

/// Decode a `textures` property value to the skin URL.
pub fn skin_url(encoded: &str) -> Result<Option<String>> {
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| RenderError::schema("profile textures", e))?;
    let textures: Value = serde_json::from_slice(&decoded)?;
    Ok(textures
        .pointer("/textures/SKIN/url")
        .and_then(Value::as_str)
        .map(str::to_string))
}

impl<F> ProfileResolver for F
where
    F: Fn(&Value) -> Result<Option<TextureData>>,
{
    fn fetch_skin(&self, profile: &Value) -> Result<Option<TextureData>> {
        self(profile)
    }
}

#[cfg(feature = "net")]
pub use mojang::MojangProfileResolver;

#[cfg(feature = "net")]
mod mojang {
    use super::*;
    use crate::cache::Cache;
    use crate::resource_pack::texture::load_texture_from_bytes;
    use reqwest::blocking::Client;
    use reqwest::StatusCode;

    const PROFILE_BY_NAME: &str = "https://api.mojang.com/users/profiles/minecraft/";
    const SESSION_PROFILE: &str = "https://sessionserver.mojang.com/session/minecraft/profile/";

    fn network(e: impl ToString) -> RenderError {
        RenderError::Network(e.to_string())
    }

    /// Looks up skins through the Mojang API, caching downloads.
    pub struct MojangProfileResolver<'c> {
        client: Client,
        cache: &'c dyn Cache,
    }

    impl<'c> MojangProfileResolver<'c> {
        pub fn new(cache: &'c dyn Cache) -> Self {
            Self {
                client: Client::new(),
                cache,
            }
        }

        /// GET a JSON document; 204 and 404 mean "no such profile".
        fn get_json(&self, url: &str) -> Result<Option<Value>> {
            let response = self.client.get(url).send().map_err(network)?;
            if matches!(response.status(), StatusCode::NO_CONTENT | StatusCode::NOT_FOUND) {
                return Ok(None);
            }
            let body = response
                .error_for_status()
                .map_err(network)?
                .text()
                .map_err(network)?;
            Ok(Some(serde_json::from_str(&body)?))
        }

        fn uuid_for_name(&self, name: &str) -> Result<Option<String>> {
            Ok(self
                .get_json(&format!("{}{}", PROFILE_BY_NAME, name))?
                .and_then(|p| p.get("id").and_then(Value::as_str).map(str::to_string)))
        }

        fn textures_for_uuid(&self, uuid: &str) -> Result<Option<String>> {
            Ok(self
                .get_json(&format!("{}{}", SESSION_PROFILE, uuid))?
                .and_then(|p| textures_property(&p).map(str::to_string)))
        }

        fn download(&self, url: &str, cache_key: &str) -> Result<Vec<u8>> {
            if let Some(bytes) = self.cache.get(cache_key) {
                return Ok(bytes);
            }
            tracing::info!("downloading skin {}", url);
            let bytes = self
                .client
                .get(url)
                .send()
                .and_then(|r| r.error_for_status())
                .and_then(|r| r.bytes())
                .map_err(network)?;
            self.cache.put(cache_key, &bytes)?;
            Ok(bytes.to_vec())
        }
    }

    impl ProfileResolver for MojangProfileResolver<'_> {
        fn fetch_skin(&self, profile: &Value) -> Result<Option<TextureData>> {
            let mut uuid = profile_id(profile);
            let encoded = match textures_property(profile) {
                Some(inline) => Some(inline.to_string()),
                None => {
                    if uuid.is_none() {
                        if let Some(name) = profile_name(profile) {
                            uuid = self.uuid_for_name(name)?;
                        }
                    }
                    match &uuid {
                        Some(uuid) => self.textures_for_uuid(uuid)?,
                        None => None,
                    }
                }
            };
            let Some(url) = encoded.as_deref().map(skin_url).transpose()?.flatten() else {
                return Ok(None);
            };

            let key = match &uuid {
                Some(uuid) => format!("skin/{}", uuid),
                None => format!("skin/{}", url.rsplit('/').next().unwrap_or("unknown")),
            };
            let bytes = self.download(&url, &key)?;
            Ok(Some(load_texture_from_bytes(&bytes)?))
        }
    }
}
