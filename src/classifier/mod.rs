pub mod classifier_models;
pub mod classifier_service;

pub use classifier_models::{
    ClassifierConfig, DeletePolicy, MessageTemplates, RelevanceDecision, RoleScope,
};
pub use classifier_service::Classifier;
