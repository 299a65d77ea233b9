//! Builds the `RenderContext` templates are rendered against from a canonical `CvData`.

use crate::cv::custom;
use crate::cv::levels::{LanguageLevel, SkillRating};
use crate::cv::model::{
    CertificationItem, CvData, EducationItem, ExperienceItem, LanguageItem, ProjectItem,
    ReferenceItem, SkillItem,
};
use crate::render::RenderContext;

/// End-date words meaning "still ongoing", compared case-insensitively.
const PRESENT_WORDS: &[&str] = &["present", "présent", "aujourd'hui", "current"];

pub fn build_context(mut cv: CvData) -> RenderContext {
    custom::absorb_sections(&mut cv);

    let (full_name, first_name, last_name) = names(&cv);
    let mut ctx = RenderContext::new()
        .with("full_name", full_name)
        .with("first_name", first_name)
        .with("last_name", last_name);

    for (key, value) in [
        ("title", &cv.title),
        ("email", &cv.email),
        ("phone", &cv.phone),
        ("address", &cv.address),
        ("city", &cv.city),
        ("postal_code", &cv.postal_code),
        ("photo", &cv.photo),
        ("date_of_birth", &cv.date_of_birth),
        ("nationality", &cv.nationality),
        ("driving_license", &cv.driving_license),
        ("summary", &cv.summary),
        ("linkedin_url", &cv.linkedin_url),
        ("github_url", &cv.github_url),
        ("website", &cv.website),
    ] {
        ctx.insert(key, value.as_str());
    }

    ctx.insert("experience_data", list(&cv.experiences, experience));
    ctx.insert("education_data", list(&cv.education, education));
    ctx.insert("skills_data", list(&cv.skills, skill));
    ctx.insert("languages_data", list(&cv.languages, language));
    ctx.insert("certifications_data", list(&cv.certifications, certification));
    ctx.insert("projects_data", list(&cv.projects, project));
    ctx.insert(
        "hobbies_data",
        list(&cv.hobbies, |h| RenderContext::new().with("name", h.name.as_str())),
    );
    ctx.insert("references_data", list(&cv.references, reference));
    ctx.insert(
        "custom_sections",
        list(&custom::merged_sections(&cv), |s| {
            RenderContext::new()
                .with("title", s.title.as_str())
                .with("content", s.content.as_str())
        }),
    );

    ctx
}

fn list<T>(items: &[T], to_ctx: impl Fn(&T) -> RenderContext) -> Vec<RenderContext> {
    items.iter().map(to_ctx).collect()
}

/// `(full_name, first_name, last_name)`, each derived from the other when missing.
fn names(cv: &CvData) -> (String, String, String) {
    let full = cv.full_name.trim();
    let mut first = cv.first_name.trim().to_string();
    let mut last = cv.last_name.trim().to_string();

    if first.is_empty() && last.is_empty() && !full.is_empty() {
        let (f, l) = full.split_once(' ').unwrap_or((full, ""));
        first = f.trim().to_string();
        last = l.trim().to_string();
    }

    let full = if full.is_empty() {
        format!("{first} {last}").trim().to_string()
    } else {
        full.to_string()
    };

    (full, first, last)
}

/// `(is_current, end_date)` with the end date blanked for ongoing items.
fn date_range(flag: bool, end_date: &str) -> (bool, String) {
    let end = end_date.trim();
    let lowered = end.to_lowercase();
    let is_current = flag || PRESENT_WORDS.contains(&lowered.as_str());
    let end_date = if is_current { String::new() } else { end.to_string() };
    (is_current, end_date)
}

fn experience(item: &ExperienceItem) -> RenderContext {
    let (is_current, end_date) = date_range(item.is_current, &item.end_date);
    RenderContext::new()
        .with("position", item.position.as_str())
        .with("company", item.company.as_str())
        .with("location", item.location.as_str())
        .with("start_date", item.start_date.as_str())
        .with("end_date", end_date)
        .with("is_current", is_current)
        .with("description", item.description.as_str())
        .with("work_mode", item.work_mode.as_str())
}

fn education(item: &EducationItem) -> RenderContext {
    let (is_current, end_date) = date_range(item.is_current, &item.end_date);
    RenderContext::new()
        .with("degree", item.degree.as_str())
        .with("field_of_study", item.field_of_study.as_str())
        .with("institution", item.institution.as_str())
        .with("location", item.location.as_str())
        .with("start_date", item.start_date.as_str())
        .with("end_date", end_date)
        .with("is_current", is_current)
        .with("grade", item.grade.as_str())
        .with("description", item.description.as_str())
        .with("work_mode", item.work_mode.as_str())
}

fn skill(item: &SkillItem) -> RenderContext {
    let rating = SkillRating::parse(&item.level);
    RenderContext::new()
        .with("name", item.name.as_str())
        .with("level", rating.level.code())
        .with("level_percentage", rating.percentage())
        .with("category", item.category.as_str())
}

fn language(item: &LanguageItem) -> RenderContext {
    let level = LanguageLevel::parse(&item.level);
    RenderContext::new()
        .with("name", item.name.as_str())
        .with("level", level.code())
        .with("level_label", level.label())
        .with("level_percentage", level.percentage().to_string())
}

fn certification(item: &CertificationItem) -> RenderContext {
    RenderContext::new()
        .with("name", item.name.as_str())
        .with("issuer", item.issuer.as_str())
        .with("date", item.date.as_str())
        .with("credential_id", item.credential_id.as_str())
        .with("url", item.url.as_str())
}

fn project(item: &ProjectItem) -> RenderContext {
    RenderContext::new()
        .with("name", item.name.as_str())
        .with("description", item.description.as_str())
        .with("url", item.url.as_str())
        .with("date", item.date.as_str())
        .with("technologies", item.technologies.as_str())
}

fn reference(item: &ReferenceItem) -> RenderContext {
    RenderContext::new()
        .with("name", item.name.as_str())
        .with("company", item.company.as_str())
        .with("position", item.position.as_str())
        .with("email", item.email.as_str())
        .with("phone", item.phone.as_str())
}
