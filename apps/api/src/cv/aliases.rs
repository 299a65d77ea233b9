//! Field-name normalization between the UI-local and backend-transport CV shapes.
//!
//! Every alternate name maps to exactly one canonical name, per scope. The
//! canonical name wins when a payload carries both.

use serde_json::{Map, Value};

/// Nested object of the UI shape whose fields live at the top level canonically.
const PERSONAL_INFO_KEYS: &[&str] = &["personalInfo", "personal_info"];

pub const TOP_LEVEL_ALIASES: &[(&str, &str)] = &[
    ("fullName", "full_name"),
    ("firstName", "first_name"),
    ("lastName", "last_name"),
    ("jobTitle", "title"),
    ("professionalSummary", "summary"),
    ("profilePhoto", "photo"),
    ("postalCode", "postal_code"),
    ("dateOfBirth", "date_of_birth"),
    ("drivingLicense", "driving_license"),
    ("linkedin", "linkedin_url"),
    ("linkedinUrl", "linkedin_url"),
    ("github", "github_url"),
    ("githubUrl", "github_url"),
    ("experience_data", "experiences"),
    ("education_data", "education"),
    ("skills_data", "skills"),
    ("languages_data", "languages"),
    ("certifications_data", "certifications"),
    ("projects_data", "projects"),
    ("hobbies_data", "hobbies"),
    ("references_data", "references"),
    ("customSections", "custom_sections"),
];

pub const EXPERIENCE_ALIASES: &[(&str, &str)] = &[
    ("jobTitle", "position"),
    ("employer", "company"),
    ("city", "location"),
    ("startDate", "start_date"),
    ("endDate", "end_date"),
    ("currentJob", "is_current"),
    ("isCurrent", "is_current"),
    ("workMode", "work_mode"),
];

pub const EDUCATION_ALIASES: &[(&str, &str)] = &[
    ("school", "institution"),
    ("fieldOfStudy", "field_of_study"),
    ("city", "location"),
    ("startDate", "start_date"),
    ("endDate", "end_date"),
    ("currentStudy", "is_current"),
    ("isCurrent", "is_current"),
    ("workMode", "work_mode"),
];

pub const CERTIFICATION_ALIASES: &[(&str, &str)] = &[
    ("organization", "issuer"),
    ("verificationUrl", "url"),
    ("credentialId", "credential_id"),
];

/// Canonical list field → aliases applied to each of its items.
const SECTION_ALIASES: &[(&str, &[(&str, &str)])] = &[
    ("experiences", EXPERIENCE_ALIASES),
    ("education", EDUCATION_ALIASES),
    ("certifications", CERTIFICATION_ALIASES),
];

/// Rewrites a CV payload in either naming convention into canonical names.
/// Unknown keys are left untouched.
pub fn normalize(mut root: Map<String, Value>) -> Map<String, Value> {
    for key in PERSONAL_INFO_KEYS {
        if let Some(Value::Object(personal)) = root.remove(*key) {
            for (k, v) in personal {
                root.entry(k).or_insert(v);
            }
        }
    }

    rename_keys(&mut root, TOP_LEVEL_ALIASES);

    for (section, aliases) in SECTION_ALIASES {
        if let Some(Value::Array(items)) = root.get_mut(*section) {
            for item in items.iter_mut() {
                if let Value::Object(fields) = item {
                    rename_keys(fields, aliases);
                }
            }
        }
    }

    root
}

fn rename_keys(fields: &mut Map<String, Value>, aliases: &[(&str, &str)]) {
    for (alias, canonical) in aliases {
        if let Some(value) = fields.remove(*alias) {
            if !fields.contains_key(*canonical) {
                fields.insert(canonical.to_string(), value);
            }
        }
    }
}
