//! Hobbies and references travel to the backend as free-text custom sections.
//! These functions write and read that text form.

use crate::cv::model::{CustomSection, CvData, HobbyItem, ReferenceItem};

pub const HOBBIES_TITLE: &str = "Centres d'intérêt";
pub const REFERENCES_TITLE: &str = "Références";

pub fn hobbies_section(hobbies: &[HobbyItem]) -> Option<CustomSection> {
    if hobbies.is_empty() {
        return None;
    }
    let names: Vec<&str> = hobbies.iter().map(|h| h.name.as_str()).collect();
    Some(CustomSection {
        title: HOBBIES_TITLE.to_string(),
        content: names.join(", "),
    })
}

pub fn references_section(references: &[ReferenceItem]) -> Option<CustomSection> {
    if references.is_empty() {
        return None;
    }
    let blocks: Vec<String> = references
        .iter()
        .map(|r| {
            format!(
                "{} - {} chez {}\n{} | {}",
                r.name, r.position, r.company, r.email, r.phone
            )
        })
        .collect();
    Some(CustomSection {
        title: REFERENCES_TITLE.to_string(),
        content: blocks.join("\n\n"),
    })
}

pub fn parse_hobbies(content: &str) -> Vec<HobbyItem> {
    content
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .enumerate()
        .map(|(i, name)| HobbyItem {
            id: format!("hobby-{i}"),
            name: name.to_string(),
        })
        .collect()
}

/// Reads `name - position chez company` / `email | phone` blocks separated by blank lines.
pub fn parse_references(content: &str) -> Vec<ReferenceItem> {
    content
        .split("\n\n")
        .filter(|block| !block.trim().is_empty())
        .enumerate()
        .map(|(i, block)| {
            let mut lines = block.trim_start_matches('\n').lines();
            let heading = lines.next().unwrap_or_default();
            let contact = lines.next().unwrap_or_default();

            let (name, role) = heading.split_once(" - ").unwrap_or((heading, ""));
            let (position, company) = role.rsplit_once(" chez ").unwrap_or((role, ""));
            let (email, phone) = contact.split_once(" | ").unwrap_or((contact, ""));

            ReferenceItem {
                id: format!("ref-{i}"),
                name: name.trim().to_string(),
                position: position.trim().to_string(),
                company: company.trim().to_string(),
                email: email.trim().to_string(),
                phone: phone.trim().to_string(),
            }
        })
        .collect()
}

/// Recovers hobbies and references from their custom sections when the snapshot
/// carries no structured lists for them, removing the consumed sections.
pub fn absorb_sections(cv: &mut CvData) {
    if cv.hobbies.is_empty() {
        if let Some(pos) = find_section(cv, HOBBIES_TITLE) {
            let section = cv.custom_sections.remove(pos);
            cv.hobbies = parse_hobbies(&section.content);
        }
    }
    if cv.references.is_empty() {
        if let Some(pos) = find_section(cv, REFERENCES_TITLE) {
            let section = cv.custom_sections.remove(pos);
            cv.references = parse_references(&section.content);
        }
    }
}

/// Custom sections as templates see them: generated ones first, then the rest.
/// Sections whose title collides with a generated one are dropped.
pub fn merged_sections(cv: &CvData) -> Vec<CustomSection> {
    let generated: Vec<CustomSection> = hobbies_section(&cv.hobbies)
        .into_iter()
        .chain(references_section(&cv.references))
        .collect();

    let others = cv
        .custom_sections
        .iter()
        .filter(|s| !generated.iter().any(|g| g.title == s.title))
        .cloned()
        .collect::<Vec<_>>();

    generated.into_iter().chain(others).collect()
}

fn find_section(cv: &CvData, title: &str) -> Option<usize> {
    cv.custom_sections
        .iter()
        .position(|s| s.title.trim() == title)
}
