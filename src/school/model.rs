use std::fmt;
use std::ops::Index;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{Endpoints, SchoolClient, SchoolError};

/// Literal line placed between the textbook text of consecutive lessons.
pub const LESSON_SEPARATOR: &str = "\n\n|END OF TEXTBOOK|\n\n";

pub const TEXTBOOK: &str = "textbook";

/// Platform identifier. The API sends some ids as numbers and some as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "RawId")]
pub struct Id(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawId> for Id {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => Id(s),
            RawId::Number(n) => Id(n.to_string()),
        }
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id(s.to_string())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubjectRecord {
    program_id: Id,
    program_name: String,
    #[serde(default)]
    lessons: Vec<LessonRecord>,
}

#[derive(Deserialize)]
struct LessonRecord {
    id: Id,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MaterialRecord {
    id: Id,
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    textbook: Option<TextbookRecord>,
}

#[derive(Debug, Deserialize)]
struct TextbookRecord {
    #[serde(rename = "rawText", default)]
    raw_text: Option<String>,
}

/// `response` object of the lesson-detail endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LessonDetail {
    #[serde(default)]
    pub next_id: Option<Id>,
    #[serde(default)]
    pub prev_id: Option<Id>,
    pub lesson: LessonBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LessonBody {
    #[serde(default)]
    pub materials: Vec<MaterialRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

#[derive(Debug, Clone)]
pub struct Material {
    pub id: Id,
    pub name: String,
    /// Lower-cased material type, e.g. `textbook`, `video`.
    pub kind: String,
    pub lesson_id: Id,
    pub url: String,
    pub text: String,
}

impl Material {
    fn from_record(lesson: &Lesson, record: MaterialRecord) -> Self {
        let kind = record.kind.to_lowercase();
        let text = if kind == TEXTBOOK {
            record
                .textbook
                .and_then(|t| t.raw_text)
                .unwrap_or_default()
        } else {
            String::new()
        };
        let url = format!("{}?type={}&materialId={}", lesson.url(), kind, record.id);

        Self {
            id: record.id,
            name: record.name,
            kind,
            lesson_id: lesson.id.clone(),
            url,
            text,
        }
    }

    pub fn is_textbook(&self) -> bool {
        self.kind == TEXTBOOK
    }
}

#[derive(Debug, Clone)]
pub struct Lesson {
    pub id: Id,
    pub name: String,
    pub subject_id: Id,
    subject_url: String,
    materials: Vec<Material>,
    next_id: Option<Id>,
    prev_id: Option<Id>,
}

impl Lesson {
    fn new(subject: &Subject, record: LessonRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            subject_id: subject.id.clone(),
            subject_url: subject.url.clone(),
            materials: Vec::new(),
            next_id: None,
            prev_id: None,
        }
    }

    fn make_url(&self, id: &Id) -> String {
        format!("{}/lesson/{}", self.subject_url, id)
    }

    pub fn url(&self) -> String {
        self.make_url(&self.id)
    }

    pub fn next_id(&self) -> Option<&Id> {
        self.next_id.as_ref()
    }

    pub fn prev_id(&self) -> Option<&Id> {
        self.prev_id.as_ref()
    }

    pub fn next_url(&self) -> Option<String> {
        self.next_id.as_ref().map(|id| self.make_url(id))
    }

    pub fn prev_url(&self) -> Option<String> {
        self.prev_id.as_ref().map(|id| self.make_url(id))
    }

    /// Every material of the last fetch, in API order. Empty until
    /// [`Lesson::load_content`] has run.
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn textbook_materials(&self) -> Vec<&Material> {
        self.materials.iter().filter(|m| m.is_textbook()).collect()
    }

    /// Fetches the lesson detail, replaces navigation ids and materials, and
    /// returns the joined textbook text. Re-fetches on every call.
    pub async fn load_content(&mut self, client: &SchoolClient) -> Result<String, SchoolError> {
        let detail = client.fetch_lesson(&self.id).await?;
        Ok(self.apply(detail))
    }

    pub(crate) fn apply(&mut self, detail: LessonDetail) -> String {
        self.next_id = detail.next_id;
        self.prev_id = detail.prev_id;

        let materials: Vec<Material> = detail
            .lesson
            .materials
            .into_iter()
            .map(|record| Material::from_record(self, record))
            .collect();
        self.materials = materials;
        debug!(lesson = %self.id, materials = self.materials.len(), "lesson content loaded");

        self.textbook_materials()
            .into_iter()
            .map(|m| m.text.as_str())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct Subject {
    pub id: Id,
    pub name: String,
    pub url: String,
    lessons: Vec<Lesson>,
}

impl Subject {
    /// Builds a subject from one raw catalog record (`programId`,
    /// `programName`, `lessons`).
    pub fn from_record(record: &Value, endpoints: &Endpoints) -> Result<Self, SchoolError> {
        let record = SubjectRecord::deserialize(record)?;
        let mut subject = Self {
            url: endpoints.subject_page(&record.program_id),
            id: record.program_id,
            name: record.program_name,
            lessons: Vec::new(),
        };
        subject.lessons = record
            .lessons
            .into_iter()
            .map(|lesson| Lesson::new(&subject, lesson))
            .collect();
        Ok(subject)
    }

    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    pub fn lesson_ids(&self) -> Vec<&Id> {
        self.lessons.iter().map(|l| &l.id).collect()
    }

    pub fn lesson_names(&self) -> Vec<&str> {
        self.lessons.iter().map(|l| l.name.as_str()).collect()
    }

    pub fn lesson_by_id(&self, id: &Id) -> Option<&Lesson> {
        self.lessons.iter().find(|l| &l.id == id)
    }

    pub fn lesson_by_name(&self, name: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.name == name)
    }

    /// Lesson reached from `id` through its fetched navigation ids, if that
    /// lesson belongs to this subject.
    pub fn adjacent(&self, id: &Id, direction: Direction) -> Option<&Lesson> {
        let lesson = self.lesson_by_id(id)?;
        let target = match direction {
            Direction::Next => lesson.next_id()?,
            Direction::Prev => lesson.prev_id()?,
        };
        self.lesson_by_id(target)
    }

    pub async fn load_lesson_text(
        &mut self,
        client: &SchoolClient,
        id: &Id,
    ) -> Result<String, SchoolError> {
        let subject = self.name.clone();
        let lesson = self
            .lessons
            .iter_mut()
            .find(|l| &l.id == id)
            .ok_or_else(|| SchoolError::LessonNotFound {
                lesson: id.clone(),
                subject,
            })?;
        lesson.load_content(client).await
    }

    /// Fetches every lesson in order and joins their textbook text with
    /// [`LESSON_SEPARATOR`].
    pub async fn load_lessons_text(&mut self, client: &SchoolClient) -> Result<String, SchoolError> {
        let mut texts = Vec::with_capacity(self.lessons.len());
        for lesson in self.lessons.iter_mut() {
            texts.push(lesson.load_content(client).await?);
        }
        Ok(texts.join(LESSON_SEPARATOR))
    }
}

impl Index<usize> for Subject {
    type Output = Lesson;

    fn index(&self, i: usize) -> &Lesson {
        &self.lessons[i]
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} lessons", self.name, self.len())
    }
}
