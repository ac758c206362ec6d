use serde::{Deserialize, Serialize};

use crate::domain::model::ExportOptions;

/// Product details as returned by `GET /products/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub name: String,
    #[serde(rename = "type", default)]
    pub product_type: String,
    pub details: ProductDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductDetails {
    pub gms_hash: GmsHash,
}

/// Motion parameters of an animation product.
#[derive(Debug, Clone, Deserialize)]
pub struct GmsHash {
    #[serde(rename = "model-id")]
    pub model_id: i64,
    #[serde(default)]
    pub mirror: bool,
    #[serde(default)]
    pub trim: Vec<f64>,
    #[serde(default)]
    pub overdrive: f64,
    /// `[name, value]` pairs
    #[serde(default)]
    pub params: Vec<(String, serde_json::Value)>,
    #[serde(rename = "arm-space", default)]
    pub arm_space: i64,
    #[serde(default)]
    pub inplace: bool,
}

/// The export endpoint wants the parameter values only, comma separated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportGmsHash {
    #[serde(rename = "model-id")]
    pub model_id: i64,
    pub mirror: bool,
    pub trim: Vec<f64>,
    pub overdrive: f64,
    pub params: String,
    #[serde(rename = "arm-space")]
    pub arm_space: i64,
    pub inplace: bool,
}

impl From<&GmsHash> for ExportGmsHash {
    fn from(hash: &GmsHash) -> Self {
        let params = hash
            .params
            .iter()
            .map(|(_, value)| match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(",");

        Self {
            model_id: hash.model_id,
            mirror: hash.mirror,
            trim: hash.trim.clone(),
            overdrive: hash.overdrive,
            params,
            arm_space: hash.arm_space,
            inplace: hash.inplace,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportPreferences {
    pub format: String,
    pub skin: String,
    pub fps: String,
    pub reducekf: String,
}

impl From<&ExportOptions> for ExportPreferences {
    fn from(options: &ExportOptions) -> Self {
        Self {
            format: options.format.site_code().to_string(),
            skin: options.skin.to_string(),
            fps: options.fps.to_string(),
            reducekf: if options.reduce_keyframes { "1" } else { "0" }.to_string(),
        }
    }
}

/// Body of `POST /animations/export`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRequest {
    pub character_id: String,
    pub gms_hash: Vec<ExportGmsHash>,
    pub preferences: ExportPreferences,
    pub product_name: String,
    #[serde(rename = "type")]
    pub export_type: String,
}

impl ExportRequest {
    pub fn animation(character_id: &str, product: &Product, options: &ExportOptions) -> Self {
        Self {
            character_id: character_id.to_string(),
            gms_hash: vec![ExportGmsHash::from(&product.details.gms_hash)],
            preferences: ExportPreferences::from(options),
            product_name: product.name.clone(),
            export_type: "Motion".to_string(),
        }
    }

    /// The bare character in T-pose.
    pub fn character_model(
        character_id: &str,
        character_name: &str,
        options: &ExportOptions,
    ) -> Self {
        Self {
            character_id: character_id.to_string(),
            gms_hash: Vec::new(),
            preferences: ExportPreferences::from(options),
            product_name: character_name.to_string(),
            export_type: "Character".to_string(),
        }
    }
}

/// Response of `GET /characters/{id}/monitor`.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorStatus {
    pub status: String,
    #[serde(default)]
    pub job_result: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl MonitorStatus {
    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }

    pub fn is_failed(&self) -> bool {
        self.status == "failed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ExportFormat;

    const PRODUCT: &str = r#"{
        "name": "Walking",
        "type": "Motion",
        "details": {
            "gms_hash": {
                "model-id": 103120902,
                "mirror": false,
                "trim": [0, 100],
                "overdrive": 0,
                "params": [["Posture", 0.5], ["Arm-Space", 0], ["Step Width", "1"]],
                "arm-space": 0,
                "inplace": false
            }
        }
    }"#;

    #[test]
    fn test_params_flattened_to_values() {
        let product: Product = serde_json::from_str(PRODUCT).unwrap();
        let hash = ExportGmsHash::from(&product.details.gms_hash);
        assert_eq!(hash.params, "0.5,0,1");
        assert_eq!(hash.model_id, 103120902);
    }

    #[test]
    fn test_animation_export_body() {
        let product: Product = serde_json::from_str(PRODUCT).unwrap();
        let options = ExportOptions {
            format: ExportFormat::Collada,
            fps: 60,
            skin: false,
            reduce_keyframes: true,
        };
        let body =
            serde_json::to_value(ExportRequest::animation("char-1", &product, &options)).unwrap();

        assert_eq!(body["type"], "Motion");
        assert_eq!(body["product_name"], "Walking");
        assert_eq!(body["gms_hash"][0]["model-id"], 103120902);
        assert_eq!(body["preferences"]["format"], "dae_mixamo");
        assert_eq!(body["preferences"]["fps"], "60");
        assert_eq!(body["preferences"]["skin"], "false");
        assert_eq!(body["preferences"]["reducekf"], "1");
    }

    #[test]
    fn test_character_model_export_body() {
        let options = ExportOptions {
            skin: true,
            ..Default::default()
        };
        let request = ExportRequest::character_model("char-1", "Remy", &options);
        assert_eq!(request.export_type, "Character");
        assert!(request.gms_hash.is_empty());
        assert_eq!(request.preferences.skin, "true");
        assert_eq!(request.preferences.format, "fbx7");
    }

    #[test]
    fn test_monitor_status() {
        let done: MonitorStatus = serde_json::from_str(
            r#"{"status":"completed","job_result":"https://cdn/x.fbx"}"#,
        )
        .unwrap();
        assert!(done.is_completed());
        assert_eq!(done.job_result.as_deref(), Some("https://cdn/x.fbx"));

        let busy: MonitorStatus = serde_json::from_str(r#"{"status":"processing"}"#).unwrap();
        assert!(!busy.is_completed());
        assert!(!busy.is_failed());
    }
}
