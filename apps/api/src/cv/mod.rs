//! CV snapshot → `RenderContext`.
//!
//! Accepts the UI-local shape (`personalInfo`, `jobTitle`, numeric skill levels,
//! French language labels) and the backend-transport shape (`full_name`,
//! `experience_data`, string level codes) and yields the same context for both.

pub mod aliases;
pub mod builder;
pub mod custom;
pub mod levels;
pub mod model;

use thiserror::Error;

use crate::render::RenderContext;

pub use builder::build_context;
pub use model::CvData;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("CV data must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("CV data has an invalid shape: {0}")]
    InvalidShape(#[from] serde_json::Error),
}

/// Normalizes a CV snapshot in either naming convention into canonical `CvData`.
/// An absent (`null`) snapshot is an empty CV.
pub fn parse_cv(value: serde_json::Value) -> Result<CvData, ContextError> {
    let map = match value {
        serde_json::Value::Object(map) => map,
        serde_json::Value::Null => serde_json::Map::new(),
        other => return Err(ContextError::NotAnObject(json_kind(&other))),
    };
    let normalized = aliases::normalize(map);
    Ok(serde_json::from_value(serde_json::Value::Object(normalized))?)
}

pub fn context_from_json(value: serde_json::Value) -> Result<RenderContext, ContextError> {
    let cv = parse_cv(value)?;
    Ok(build_context(cv))
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{render, Value};
    use serde_json::json;

    fn ui_shape() -> serde_json::Value {
        json!({
            "personalInfo": {
                "firstName": "Jane",
                "lastName": "Doe",
                "email": "jane@example.com",
                "phone": "0601020304",
                "city": "Paris",
                "postalCode": "75001",
                "jobTitle": "Engineer",
                "linkedin": "https://linkedin.com/in/jane",
                "photo": null
            },
            "professionalSummary": "Builds things.",
            "experiences": [{
                "id": "1",
                "jobTitle": "Engineer",
                "employer": "Acme",
                "city": "Lyon",
                "startDate": "2020-01",
                "endDate": "2023-01",
                "currentJob": true,
                "description": "Shipping",
                "workMode": "remote"
            }],
            "education": [{
                "id": "2",
                "degree": "MSc",
                "school": "ENS",
                "city": "Paris",
                "startDate": "2015",
                "endDate": "2017",
                "currentStudy": false,
                "description": ""
            }],
            "skills": [{"id": "3", "name": "Rust", "level": 4}],
            "languages": [{"id": "4", "name": "Anglais", "level": "Courant"}],
            "hobbies": [{"id": "5", "name": "Chess"}, {"id": "6", "name": "Running"}],
            "references": [{
                "id": "7",
                "name": "Ann Smith",
                "position": "CTO",
                "company": "Acme",
                "email": "ann@acme.test",
                "phone": "0102030405"
            }]
        })
    }

    fn transport_shape() -> serde_json::Value {
        json!({
            "full_name": "Jane Doe",
            "email": "jane@example.com",
            "phone": "0601020304",
            "city": "Paris",
            "postal_code": "75001",
            "title": "Engineer",
            "linkedin_url": "https://linkedin.com/in/jane",
            "photo": "",
            "summary": "Builds things.",
            "experience_data": [{
                "position": "Engineer",
                "company": "Acme",
                "location": "Lyon",
                "start_date": "2020-01",
                "end_date": "",
                "is_current": true,
                "description": "Shipping",
                "work_mode": "remote"
            }],
            "education_data": [{
                "degree": "MSc",
                "institution": "ENS",
                "field_of_study": "",
                "location": "Paris",
                "start_date": "2015",
                "end_date": "2017",
                "is_current": false,
                "grade": "",
                "description": ""
            }],
            "skills_data": [{"name": "Rust", "level": "advanced", "category": ""}],
            "languages_data": [{"name": "Anglais", "level": "fluent"}],
            "certifications_data": [],
            "projects_data": [],
            "custom_sections": [
                {"title": "Centres d'intérêt", "content": "Chess, Running"},
                {
                    "title": "Références",
                    "content": "Ann Smith - CTO chez Acme\nann@acme.test | 0102030405"
                }
            ]
        })
    }

    #[test]
    fn test_both_shapes_yield_identical_contexts() {
        let ui = context_from_json(ui_shape()).unwrap();
        let transport = context_from_json(transport_shape()).unwrap();
        assert_eq!(ui, transport);
    }

    #[test]
    fn test_rendering_is_shape_independent() {
        let template = "<h1>{{full_name}}</h1>{{#each experience_data}}<p>{{position}} @ {{company}}\
            {{#if is_current}} (en poste){{/if}}</p>{{/each}}\
            {{#each skills_data}}<i>{{name}}:{{level}}</i>{{/each}}";
        let ui = render(template, &context_from_json(ui_shape()).unwrap());
        let transport = render(template, &context_from_json(transport_shape()).unwrap());
        assert_eq!(ui, transport);
        assert_eq!(
            ui,
            "<h1>Jane Doe</h1><p>Engineer @ Acme (en poste)</p><i>Rust:advanced</i>"
        );
    }

    #[test]
    fn test_non_object_is_rejected() {
        let err = context_from_json(json!([1, 2])).unwrap_err();
        assert!(matches!(err, ContextError::NotAnObject("an array")));
        assert!(context_from_json(json!("jane")).is_err());
    }

    #[test]
    fn test_null_is_an_empty_cv() {
        assert_eq!(
            context_from_json(json!(null)).unwrap(),
            context_from_json(json!({})).unwrap()
        );
    }

    #[test]
    fn test_empty_object_builds_empty_context() {
        let ctx = context_from_json(json!({})).unwrap();
        assert_eq!(ctx.get("full_name"), Some(&Value::from("")));
        assert_eq!(ctx.get("custom_sections"), Some(&Value::List(vec![])));
    }
}
