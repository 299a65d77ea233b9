//! Heuristic CV parser over plain text extracted from a PDF.
//!
//! Best effort only: every field is optional and nothing here fails. Sections
//! are located by their heading line and parsed from the lines that follow it
//! up to the next heading.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use uuid::Uuid;

use crate::cv::model::{CvData, EducationItem, ExperienceItem, LanguageItem, SkillItem};

// ────────────────────────────────────────────────────────────────────────────
// Patterns
// ────────────────────────────────────────────────────────────────────────────

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\w.-]+@[\w.-]+\.\w+").expect("valid email regex"));

/// French numbers first, then a loose international form; the loose form is
/// only accepted with at least 8 digits.
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:\+33|0)[1-9](?:[ .-]?\d{2}){4}|(?:\+\d{1,3}[ .-]?)?\(?\d{1,4}\)?[ .-]?\d{1,4}[ .-]?\d{1,4}[ .-]?\d{1,4}",
    )
    .expect("valid phone regex")
});

static ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,5}[ \t]+[\w \t'-]+?),?[ \t]+(\d{5})[ \t]+([\w \t'-]+)")
        .expect("valid address regex")
});

static POSTAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{5}\b").expect("valid postal regex"));

static LINKEDIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)linkedin\.com/in/[\w-]+").expect("valid linkedin regex"));

static GITHUB_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)github\.com/[\w-]+").expect("valid github regex"));

static DATE_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\d{2}/\d{4}|\d{4})\s*[-–—]\s*(\d{2}/\d{4}|\d{4}|présent|present|aujourd'hui|current)",
    )
    .expect("valid date range regex")
});

static PRESENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)présent|present|aujourd'hui|current").expect("valid present regex")
});

static JOB_TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"[A-ZÀ-Ÿ][a-zà-ÿ ]+(?:Developer|Engineer|Manager|Consultant|Designer|Chef|Responsable|Développeur|Ingénieur)",
    )
    .expect("valid job title regex")
});

static COMPANY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\bchez|\bat|@)\s+([A-ZÀ-Ÿ][\w&.' -]*)").expect("valid company regex")
});

static SENTENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^.!?]+[.!?]+").expect("valid sentence regex"));

static DEGREE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:Master|Licence|Bachelor|MBA|Doctorat|PhD|BTS|DUT|Ingénieur|Engineer)\b")
        .expect("valid degree regex")
});

static SEGMENT_SPLIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+(?:-|–|à|at|@)\s+|[,|\n]").expect("valid segment regex")
});

static YEAR_TAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\b\d{4}\b.*$").expect("valid year tail regex"));

static STUDY_DATES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d{4})\s*[-–—]\s*(\d{4}|présent|present)").expect("valid study dates regex")
});

static NATIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:natif|native|maternelle|mother tongue)\b").expect("valid level regex")
});
static FLUENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:courant|fluent|bilingue|bilingual)\b").expect("valid level regex")
});
static ADVANCED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:avancé|advanced|c1|c2)\b").expect("valid level regex"));
static BEGINNER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:débutant|beginner|a1|a2)\b").expect("valid level regex"));

const KNOWN_SKILLS: &[&str] = &[
    "JavaScript", "TypeScript", "Python", "Java", "C++", "C#", "Ruby", "PHP", "Go", "Rust",
    "React", "Angular", "Vue", "Node.js", "Django", "Flask", "Spring", "Laravel",
    "SQL", "MongoDB", "PostgreSQL", "MySQL", "Redis",
    "Docker", "Kubernetes", "AWS", "Azure", "GCP",
    "Git", "CI/CD", "Agile", "Scrum",
    "HTML", "CSS", "Sass", "Tailwind",
];

/// Skill name → case-insensitive whole-token matcher.
static SKILL_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    KNOWN_SKILLS
        .iter()
        .map(|name| {
            let pattern = format!(r"(?i)(?:^|\W){}(?:\W|$)", regex::escape(name));
            (*name, Regex::new(&pattern).expect("valid skill regex"))
        })
        .collect()
});

/// Display name → pattern over French and English spellings.
static LANGUAGE_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("Français", r"français|french"),
        ("Anglais", r"anglais|english"),
        ("Espagnol", r"espagnol|spanish"),
        ("Allemand", r"allemand|german"),
        ("Italien", r"italien|italian"),
        ("Portugais", r"portugais|portuguese"),
        ("Chinois", r"chinois|chinese|mandarin"),
        ("Japonais", r"japonais|japanese"),
        ("Arabe", r"arabe|arabic"),
    ]
    .into_iter()
    .map(|(name, words)| {
        let pattern = format!(r"(?i)\b(?:{words})\b");
        (name, Regex::new(&pattern).expect("valid language regex"))
    })
    .collect()
});

const TITLE_KEYWORDS: &[&str] = &[
    "développeur", "ingénieur", "manager", "consultant", "analyste", "designer", "chef",
    "responsable", "directeur", "developer", "engineer", "architect", "lead",
];

const SUMMARY_HEADINGS: &[&str] = &[
    "profil", "profile", "résumé", "summary", "à propos", "about", "objectif", "objective",
];
const EXPERIENCE_HEADINGS: &[&str] = &[
    "expérience", "experience", "professionnel", "professional", "emploi", "employment",
    "parcours",
];
const EDUCATION_HEADINGS: &[&str] = &[
    "formation", "education", "diplôme", "degree", "études", "studies", "académique",
];
const OTHER_HEADINGS: &[&str] = &[
    "compétences", "skills", "langues", "languages", "centres d'intérêt", "loisirs",
    "interests", "hobbies", "références", "references", "certifications", "projets", "projects",
];

const INSTITUTION_WORDS: &[&str] = &[
    "université", "university", "école", "ecole", "school", "institute", "institut",
];

/// Headings are short lines; longer lines merely mentioning a keyword are content.
const MAX_HEADING_CHARS: usize = 40;
const MAX_SUMMARY_CHARS: usize = 500;
const MAX_DESCRIPTION_CHARS: usize = 200;
const TITLE_WINDOW_BYTES: usize = 200;
const DETAIL_WINDOW_BYTES: usize = 300;

// ────────────────────────────────────────────────────────────────────────────
// Entry point
// ────────────────────────────────────────────────────────────────────────────

/// Builds a partial CV from extracted text. Hobbies and references are never
/// guessed; every generated item gets a fresh UUID.
pub fn parse_cv_text(text: &str, lines: &[String]) -> CvData {
    let (first_name, last_name) = extract_name(lines);
    let full_name = format!("{first_name} {last_name}").trim().to_string();
    let (address, city) = extract_address(text);

    let cv = CvData {
        full_name,
        first_name,
        last_name,
        title: extract_title(lines),
        email: first_match(&EMAIL_RE, text),
        phone: extract_phone(text),
        address,
        city,
        postal_code: first_match(&POSTAL_RE, text),
        linkedin_url: first_match(&LINKEDIN_RE, text),
        github_url: first_match(&GITHUB_RE, text),
        summary: extract_summary(lines),
        experiences: section(lines, EXPERIENCE_HEADINGS)
            .map(|s| extract_experiences(&s))
            .unwrap_or_default(),
        education: section(lines, EDUCATION_HEADINGS)
            .map(|s| extract_education(&s))
            .unwrap_or_default(),
        skills: extract_skills(text),
        languages: extract_languages(text),
        ..CvData::default()
    };

    debug!(
        "Parsed CV text: {} experiences, {} education, {} skills, {} languages",
        cv.experiences.len(),
        cv.education.len(),
        cv.skills.len(),
        cv.languages.len()
    );
    cv
}

// ────────────────────────────────────────────────────────────────────────────
// Personal information
// ────────────────────────────────────────────────────────────────────────────

fn first_match(re: &Regex, text: &str) -> String {
    re.find(text).map(|m| m.as_str().to_string()).unwrap_or_default()
}

fn extract_phone(text: &str) -> String {
    PHONE_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .find(|candidate| candidate.chars().filter(char::is_ascii_digit).count() >= 8)
        .map(|phone| phone.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

/// First of the first five lines that looks like a person's name.
fn extract_name(lines: &[String]) -> (String, String) {
    let candidate = lines.iter().take(5).find(|line| {
        let words: Vec<&str> = line.split_whitespace().collect();
        (2..=4).contains(&words.len())
            && line.chars().count() < 50
            && !line.chars().any(|c| c.is_ascii_digit() || c == '@')
            && words.iter().all(|w| w.chars().count() > 1)
    });

    match candidate {
        Some(line) => {
            let mut words = line.split_whitespace();
            let first = words.next().unwrap_or_default().to_string();
            let last = words.collect::<Vec<_>>().join(" ");
            (first, last)
        }
        None => (String::new(), String::new()),
    }
}

fn extract_title(lines: &[String]) -> String {
    lines
        .iter()
        .take(10)
        .find(|line| {
            let lower = line.to_lowercase();
            TITLE_KEYWORDS.iter().any(|k| lower.contains(k))
        })
        .cloned()
        .unwrap_or_default()
}

/// `(street address, city)` from a `<number> <street>, <postal code> <city>` run.
fn extract_address(text: &str) -> (String, String) {
    ADDRESS_RE
        .captures(text)
        .map(|caps| {
            (
                caps[1].trim().to_string(),
                caps[3].trim().to_string(),
            )
        })
        .unwrap_or_default()
}

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

fn is_heading(line: &str, keywords: &[&str]) -> bool {
    if line.chars().count() > MAX_HEADING_CHARS {
        return false;
    }
    let lower = line.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

fn is_any_heading(line: &str) -> bool {
    [SUMMARY_HEADINGS, EXPERIENCE_HEADINGS, EDUCATION_HEADINGS, OTHER_HEADINGS]
        .iter()
        .any(|keywords| is_heading(line, keywords))
}

/// Lines following the first heading matching `keywords`, up to the next heading.
fn section(lines: &[String], keywords: &[&str]) -> Option<String> {
    let start = lines.iter().position(|line| is_heading(line, keywords))?;
    let body: Vec<&str> = lines[start + 1..]
        .iter()
        .map(String::as_str)
        .take_while(|line| !is_any_heading(line))
        .collect();
    Some(body.join("\n"))
}

fn extract_summary(lines: &[String]) -> String {
    let Some(body) = section(lines, SUMMARY_HEADINGS) else {
        return String::new();
    };
    let summary = body
        .lines()
        .take(5)
        .filter(|line| line.chars().count() > 20)
        .collect::<Vec<_>>()
        .join(" ");
    summary.chars().take(MAX_SUMMARY_CHARS).collect()
}

fn extract_experiences(section: &str) -> Vec<ExperienceItem> {
    let mut experiences = Vec::new();

    for caps in DATE_RANGE_RE.captures_iter(section) {
        let Some(whole) = caps.get(0) else { continue };
        let window_start = floor_boundary(section, whole.start().saturating_sub(TITLE_WINDOW_BYTES));
        let window_end =
            floor_boundary(section, whole.start() + DETAIL_WINDOW_BYTES).max(whole.end());
        let before = &section[window_start..whole.start()];
        let after = &section[whole.end()..window_end];

        let title = JOB_TITLE_RE.find_iter(before).last().map(|m| m.as_str().trim().to_string());
        let company = COMPANY_RE
            .captures(after.lines().next().unwrap_or_default())
            .map(|c| clean_company(&c[1]));

        if title.is_none() && company.is_none() {
            continue;
        }

        let is_current = PRESENT_RE.is_match(&caps[2]);
        let body = after
            .lines()
            .skip(1)
            .take_while(|line| !DATE_RANGE_RE.is_match(line))
            .collect::<Vec<_>>()
            .join(" ");

        experiences.push(ExperienceItem {
            id: Uuid::new_v4().to_string(),
            position: title.unwrap_or_else(|| "Poste".to_string()),
            company: company.unwrap_or_else(|| "Entreprise".to_string()),
            start_date: normalize_date(&caps[1]),
            end_date: if is_current {
                String::new()
            } else {
                normalize_date(&caps[2])
            },
            is_current,
            description: leading_sentences(&body, MAX_DESCRIPTION_CHARS),
            ..ExperienceItem::default()
        });
    }

    experiences
}

fn clean_company(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(|c: char| c == '.' || c == '-' || c.is_whitespace())
        .to_string()
}

fn extract_education(section: &str) -> Vec<EducationItem> {
    let mut education = Vec::new();

    for degree in DEGREE_RE.find_iter(section) {
        let window_end = floor_boundary(section, degree.start() + DETAIL_WINDOW_BYTES).max(degree.end());
        let after = &section[degree.start()..window_end];

        let mut segments = SEGMENT_SPLIT_RE.split(after);
        let degree_segment = segments.next().unwrap_or_default();
        let field_of_study = strip_year_tail(degree_segment.get(degree.as_str().len()..).unwrap_or_default())
            .trim()
            .trim_start_matches("en ")
            .trim_start_matches("in ")
            .trim()
            .to_string();

        let school = segments
            .find(|segment| {
                let lower = segment.to_lowercase();
                INSTITUTION_WORDS.iter().any(|w| lower.contains(w))
            })
            .map(|segment| strip_year_tail(segment).trim().to_string())
            .filter(|school| !school.is_empty());

        let dates = STUDY_DATES_RE.captures(after);
        let is_current = dates.as_ref().is_some_and(|d| PRESENT_RE.is_match(&d[2]));

        education.push(EducationItem {
            id: Uuid::new_v4().to_string(),
            degree: degree.as_str().to_string(),
            field_of_study,
            institution: school.unwrap_or_else(|| "Établissement".to_string()),
            start_date: dates.as_ref().map(|d| d[1].to_string()).unwrap_or_default(),
            end_date: match &dates {
                Some(d) if !is_current => d[2].to_string(),
                _ => String::new(),
            },
            is_current,
            ..EducationItem::default()
        });
    }

    education
}

fn strip_year_tail(segment: &str) -> &str {
    match YEAR_TAIL_RE.find(segment) {
        Some(m) => &segment[..m.start()],
        None => segment,
    }
}

fn extract_skills(text: &str) -> Vec<SkillItem> {
    SKILL_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(name, _)| SkillItem {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            level: "3".to_string(),
            ..SkillItem::default()
        })
        .collect()
}

/// Level is guessed from words following the language name on the same line or sentence.
fn extract_languages(text: &str) -> Vec<LanguageItem> {
    LANGUAGE_PATTERNS
        .iter()
        .filter_map(|(name, re)| {
            let m = re.find(text)?;
            let rest = &text[m.start()..];
            let end = rest.find(|c| c == '.' || c == '\n').unwrap_or(rest.len());
            let context = &rest[..end];

            let level = if NATIVE_RE.is_match(context) {
                "Langue maternelle"
            } else if FLUENT_RE.is_match(context) {
                "Courant"
            } else if ADVANCED_RE.is_match(context) {
                "Avancé"
            } else if BEGINNER_RE.is_match(context) {
                "Débutant"
            } else {
                "Intermédiaire"
            };

            Some(LanguageItem {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                level: level.to_string(),
            })
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Utilities
// ────────────────────────────────────────────────────────────────────────────

/// `MM/YYYY` → `YYYY-MM`, `YYYY` → `YYYY-01`; anything else (or an impossible
/// month) is returned unchanged.
fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Some((month, year)) = raw.split_once('/') {
        if let (Ok(m), Ok(y)) = (month.parse::<u32>(), year.parse::<i32>()) {
            if NaiveDate::from_ymd_opt(y, m, 1).is_some() {
                return format!("{y:04}-{m:02}");
            }
        }
        return raw.to_string();
    }
    if raw.len() == 4 && raw.chars().all(|c| c.is_ascii_digit()) {
        return format!("{raw}-01");
    }
    raw.to_string()
}

/// Whole sentences from the start of `text`, stopping before `max_chars` is exceeded.
fn leading_sentences(text: &str, max_chars: usize) -> String {
    let mut description = String::new();
    let mut used = 0;
    for sentence in SENTENCE_RE.find_iter(text) {
        let len = sentence.as_str().chars().count();
        if used + len > max_chars {
            break;
        }
        description.push_str(sentence.as_str());
        used += len;
    }
    description.trim().to_string()
}

fn floor_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}
