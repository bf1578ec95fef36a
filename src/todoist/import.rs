//! Todoist CSV import implementation
//!
//! Rows are read one at a time. A `section` row opens a new notebook and
//! every following `task` row lands in the most recent section.

use std::io::Read;
use std::path::Path;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use log::{debug, warn};

use crate::config::ConvertConfig;
use crate::converter::{has_extension, Conversion, Converter};
use crate::error::{ImportError, Result};
use crate::intermediate::{Note, Notebook, SourceApplication, Tag};

const REQUIRED_COLUMNS: [&str; 6] = ["TYPE", "CONTENT", "DESCRIPTION", "AUTHOR", "DATE", "PRIORITY"];

/// Column positions of the fields we read
struct Columns {
    row_type: usize,
    content: usize,
    description: usize,
    author: usize,
    date: usize,
    priority: usize,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
                .ok_or_else(|| ImportError::MissingColumn(name.to_string()))
        };
        let [row_type, content, description, author, date, priority] = REQUIRED_COLUMNS;
        Ok(Self {
            row_type: find(row_type)?,
            content: find(content)?,
            description: find(description)?,
            author: find(author)?,
            date: find(date)?,
            priority: find(priority)?,
        })
    }
}

/// Drop a trailing user id: `"Dieter (123)"` -> `"Dieter"`
pub fn parse_author(author: &str) -> &str {
    if let Some((name, suffix)) = author.rsplit_once(" (") {
        if let Some(digits) = suffix.strip_suffix(')') {
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                return name;
            }
        }
    }
    author
}

/// Parse a Todoist due date such as `"10 Apr"`, `"10 Apr 17:15"`,
/// `"2 Jan 2026"` or `"2 Jan 2026 09:35"`.
///
/// Dates without a year get the current year inserted before parsing, so
/// `"29 Feb"` only parses in leap years. Unknown text gives `None`.
pub fn parse_date(date: &str) -> Option<NaiveDateTime> {
    parse_date_in_year(date, Local::now().year())
}

fn parse_date_in_year(date: &str, current_year: i32) -> Option<NaiveDateTime> {
    let date = date.trim();
    if date.is_empty() {
        return None;
    }
    let with_year = format!("{} {}", current_year, date);

    NaiveDate::parse_from_str(&with_year, "%Y %d %b")
        .map(|d| d.and_time(NaiveTime::MIN))
        .or_else(|_| NaiveDateTime::parse_from_str(&with_year, "%Y %d %b %H:%M"))
        .or_else(|_| NaiveDate::parse_from_str(date, "%d %b %Y").map(|d| d.and_time(NaiveTime::MIN)))
        .or_else(|_| NaiveDateTime::parse_from_str(date, "%d %b %Y %H:%M"))
        .ok()
}

/// Split `marker`-prefixed labels from a task title.
///
/// `"Note with @multiple @labels"` -> `("Note with", ["multiple", "labels"])`
pub fn split_labels(title: &str, marker: char) -> (String, Vec<String>) {
    let mut words = Vec::new();
    let mut labels = Vec::new();
    for word in title.split_whitespace() {
        match word.strip_prefix(marker) {
            Some(label) if !label.is_empty() => labels.push(label.to_string()),
            _ => words.push(word),
        }
    }
    (words.join(" "), labels)
}

pub struct TodoistConverter {
    config: ConvertConfig,
}

impl TodoistConverter {
    pub fn new(config: ConvertConfig) -> Self {
        Self { config }
    }

    /// Convert CSV rows into a project notebook called `project`.
    pub fn convert_reader<R: Read>(&self, reader: R, project: &str) -> Result<Notebook> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let columns = Columns::from_headers(csv_reader.headers()?)?;

        let mut project_notebook = Notebook::new(project);
        // None while tasks belong to the project itself, else the index of
        // the active section in `project_notebook.child_notebooks`
        let mut current_section: Option<usize> = None;

        for record in csv_reader.records() {
            let record = record?;
            let field = |index: usize| record.get(index).unwrap_or("");

            match field(columns.row_type) {
                "section" => {
                    debug!("new notebook: {}, parent: {}", field(columns.content), project);
                    project_notebook
                        .child_notebooks
                        .push(Notebook::new(field(columns.content)));
                    current_section = Some(project_notebook.child_notebooks.len() - 1);
                }
                "task" => {
                    let note = self.convert_task(
                        field(columns.content),
                        field(columns.description),
                        field(columns.author),
                        field(columns.date),
                        field(columns.priority),
                    );
                    let section = match current_section {
                        Some(index) => &mut project_notebook.child_notebooks[index],
                        None => &mut project_notebook,
                    };
                    debug!("new note: {}, parent: {}", note.title, section.title);
                    section.child_notes.push(note);
                }
                "" => continue,
                other => warn!("Ignoring unknown row type: {}", other),
            }
        }

        Ok(project_notebook)
    }

    fn convert_task(
        &self,
        content: &str,
        description: &str,
        author: &str,
        date: &str,
        priority: &str,
    ) -> Note {
        let (title, labels) = split_labels(content, self.config.label_marker);

        let mut tag_names = labels;
        let priority = priority.trim();
        if !priority.is_empty() {
            tag_names.push(format!("{}{}", self.config.priority_tag_prefix, priority));
        }
        let tags = tag_names
            .into_iter()
            .map(|name| Tag::with_identifier(name.clone(), name))
            .collect();

        let author = parse_author(author).trim();
        let todo_due = parse_date(date).and_then(|due| {
            Local
                .from_local_datetime(&due)
                .earliest()
                .map(|dt| dt.timestamp_millis())
        });

        Note {
            author: (!author.is_empty()).then(|| author.to_string()),
            is_todo: true,
            todo_due,
            tags,
            ..Note::new(title, description, SourceApplication::Todoist)
        }
    }
}

impl Converter for TodoistConverter {
    fn source_application(&self) -> SourceApplication {
        SourceApplication::Todoist
    }

    fn accepts(&self, input: &Path) -> bool {
        has_extension(input, "csv")
    }

    fn convert(&mut self, input: &Path) -> Result<Conversion> {
        let project = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Todoist".to_string());
        let file = std::fs::File::open(input)?;
        let notebook = self.convert_reader(file, &project)?;
        Ok(Conversion {
            notebooks: vec![notebook],
            ..Default::default()
        })
    }
}
