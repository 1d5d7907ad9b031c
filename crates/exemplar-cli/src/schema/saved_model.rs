use chrono::{DateTime, Utc};
use exemplar_model::model::{LearnerModel, ModelState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SavedModel {
    pub name: String,
    pub trained_at: DateTime<Utc>,
    pub num_experiences: usize,
    pub feature_arity: Option<usize>,
    pub state: ModelState,
}

impl SavedModel {
    pub(crate) fn from_model(name: String, model: &LearnerModel) -> Self {
        let state = model.to_state();
        Self {
            name,
            trained_at: Utc::now(),
            num_experiences: state.experiences.len(),
            feature_arity: state.feature_arity,
            state,
        }
    }

    pub(crate) fn to_model(&self, min_confidence: f64) -> anyhow::Result<LearnerModel> {
        let mut model = LearnerModel::new().with_min_confidence(min_confidence);
        model.restore(self.state.clone())?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use exemplar_model::{
        instance::{FeatureValue, Instance},
        model::Model as _,
    };

    use super::*;

    #[test]
    fn test_saved_model_round_trip() {
        let mut model = LearnerModel::new();
        model
            .add_training_instance(&Instance::labeled(
                BTreeMap::from([("x".to_owned(), FeatureValue::Number(1.0))]),
                "a",
            ))
            .unwrap();

        let saved = SavedModel::from_model("demo".to_owned(), &model);
        assert_eq!(saved.num_experiences, 1);
        assert_eq!(saved.feature_arity, Some(1));

        let json = serde_json::to_string(&saved).unwrap();
        let loaded: SavedModel = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.trained_at, saved.trained_at);
        let restored = loaded.to_model(0.25).unwrap();
        assert_eq!(restored.to_state(), model.to_state());
        assert_eq!(restored.min_confidence(), 0.25);
    }
}
