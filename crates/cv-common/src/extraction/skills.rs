use lazy_static::lazy_static;
use regex::Regex;

use crate::normalize::window_after;
use crate::record::{Proficiency, Skill};

/// スキル語彙（表記は正準形。並び順がそのまま出力順になる）
pub const SKILL_VOCABULARY: &[&str] = &[
    // BIM / 建築
    "Revit",
    "AutoCAD",
    "Navisworks",
    "BIM 360",
    "Dynamo",
    "Autodesk Recap",
    "ACC",
    "Rhino",
    "Grasshopper",
    "SketchUp",
    "Lumion",
    "Enscape",
    "3ds Max",
    "Blender",
    "ArchiCAD",
    "Tekla",
    "Solibri",
    "Civil 3D",
    "MicroStation",
    "STAAD Pro",
    "ETABS",
    "V-Ray",
    // デザイン
    "Photoshop",
    "Illustrator",
    "InDesign",
    "Figma",
    "Adobe XD",
    "Sketch",
    "CorelDRAW",
    "GIMP",
    // 言語
    "Python",
    "JavaScript",
    "Java",
    "C++",
    "C#",
    "PHP",
    "Ruby",
    "Go",
    "Rust",
    "TypeScript",
    "Swift",
    "Kotlin",
    "R",
    "MATLAB",
    "VBA",
    "SQL",
    "Bash",
    "PowerShell",
    // Web
    "React",
    "Angular",
    "Vue.js",
    "Node.js",
    "Django",
    "Flask",
    "FastAPI",
    "Express.js",
    "Next.js",
    "Nuxt.js",
    "React Native",
    "Flutter",
    "HTML",
    "CSS",
    "SASS",
    "Bootstrap",
    "Tailwind CSS",
    "jQuery",
    "Svelte",
    "Laravel",
    "Spring Boot",
    ".NET",
    "GraphQL",
    "REST API",
    // DB
    "MongoDB",
    "MySQL",
    "PostgreSQL",
    "Oracle",
    "SQL Server",
    "Redis",
    "SQLite",
    "Cassandra",
    "DynamoDB",
    "Firebase",
    "NoSQL",
    "Elasticsearch",
    "Snowflake",
    // Cloud / DevOps
    "AWS",
    "Azure",
    "Google Cloud",
    "GCP",
    "Docker",
    "Kubernetes",
    "Jenkins",
    "Git",
    "GitHub",
    "GitLab",
    "Bitbucket",
    "Terraform",
    "Ansible",
    "CI/CD",
    "CircleCI",
    "Travis CI",
    "Linux",
    // データ / ML
    "TensorFlow",
    "PyTorch",
    "Scikit-learn",
    "Pandas",
    "NumPy",
    "Jupyter",
    "Keras",
    "OpenCV",
    "NLTK",
    "SpaCy",
    "Spark",
    "Hadoop",
    "Kafka",
    "Airflow",
    // BI
    "Tableau",
    "Power BI",
    "Looker",
    "QlikView",
    "Grafana",
    // Office
    "MS Office",
    "Microsoft Office",
    "Excel",
    "Word",
    "PowerPoint",
    "Outlook",
    "Google Sheets",
    "Google Docs",
    // プロジェクト管理
    "Jira",
    "Trello",
    "Asana",
    "Monday.com",
    "Microsoft Project",
    "MS Project",
    "Primavera",
    "Confluence",
    "Agile",
    "Scrum",
    "SAP",
    // テスト
    "Selenium",
    "Postman",
];

const QUALIFIER_WINDOW_CHARS: usize = 40;
const SEGMENT_DELIMITERS: &[char] = &[',', ';', '\n', '|'];

fn skill_regex(skill: &str) -> Regex {
    let escaped = regex::escape(skill).replace(' ', r"[ \t]+");
    // 大文字小文字は問わない。前後が英数字なら別の単語の一部（"Java" と "JavaScript"、"R" と "React"）
    Regex::new(&format!(r"(?i)(?:^|[^A-Za-z0-9])({escaped})(?:[^A-Za-z0-9+#&]|$)")).unwrap()
}

lazy_static! {
    static ref SKILL_RES: Vec<(&'static str, Regex)> = SKILL_VOCABULARY
        .iter()
        .map(|skill| (*skill, skill_regex(skill)))
        .collect();
    static ref YEARS_RE: Regex = Regex::new(r"(?i)\b(\d{1,2})\+?\s*(?:years?|yrs?)\b").unwrap();
    static ref PROFICIENCY_RE: Regex =
        Regex::new(r"(?i)\b(expert|advanced|proficient|intermediate|beginner|basic)\b").unwrap();
}

/// スキルを抽出（スキルセクション、なければ本文全体を渡す）
///
/// 表記は本文側のものを採用し、直後（なければ直前）の同じ区切り内から
/// "5 years" や "Expert" などの付帯情報を拾う。
pub fn extract_skills(text: &str) -> Vec<Skill> {
    let mut skills: Vec<Skill> = Vec::new();

    for (_, re) in SKILL_RES.iter() {
        let Some(hit) = re.captures(text).and_then(|caps| caps.get(1)) else {
            continue;
        };

        let name = hit.as_str().to_string();
        if skills.iter().any(|s| s.name.eq_ignore_ascii_case(&name)) {
            continue;
        }

        let after = segment_after(text, hit.end());
        let before = segment_before(text, hit.start());
        let years = find_years(after).or_else(|| find_years(before));
        let proficiency = find_proficiency(after).or_else(|| find_proficiency(before));

        skills.push(Skill {
            name,
            years,
            proficiency,
        });
    }
    skills
}

fn segment_after(text: &str, end: usize) -> &str {
    let tail = window_after(text, end, QUALIFIER_WINDOW_CHARS);
    match tail.find(SEGMENT_DELIMITERS) {
        Some(idx) => &tail[..idx],
        None => tail,
    }
}

fn segment_before(text: &str, start: usize) -> &str {
    let head = &text[..start];
    let from = head
        .rfind(SEGMENT_DELIMITERS)
        .map(|idx| idx + 1)
        .unwrap_or(0);
    let segment = &head[from..];
    let skip = segment
        .chars()
        .count()
        .saturating_sub(QUALIFIER_WINDOW_CHARS);
    match segment.char_indices().nth(skip) {
        Some((idx, _)) => &segment[idx..],
        None => segment,
    }
}

fn find_years(segment: &str) -> Option<u32> {
    YEARS_RE
        .captures(segment)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn find_proficiency(segment: &str) -> Option<Proficiency> {
    PROFICIENCY_RE
        .captures(segment)
        .and_then(|caps| caps.get(1))
        .and_then(|m| Proficiency::from_word(m.as_str()))
}
