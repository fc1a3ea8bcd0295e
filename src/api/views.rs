use crate::storage::session::Session;
use serde::Serialize;
use tera::{Context, Tera};

const TEMPLATES: [(&str, &str); 3] = [
    ("base.html", include_str!("../../templates/base.html")),
    ("index.html", include_str!("../../templates/index.html")),
    ("edit.html", include_str!("../../templates/edit.html")),
];

/// HTML pages rendered from the templates compiled into the binary.
pub struct Views {
    tera: Tera,
}

#[derive(Serialize)]
struct EditPage<'a> {
    session: &'a Session,
    line_numbers: Vec<String>,
    line_count: usize,
    saved: bool,
}

impl Views {
    pub fn new() -> tera::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.to_vec())?;
        Ok(Self { tera })
    }

    pub fn index(&self) -> tera::Result<String> {
        self.tera.render("index.html", &Context::new())
    }

    pub fn edit(&self, session: &Session, saved: bool) -> tera::Result<String> {
        let line_numbers = line_numbers(&session.json_text);
        let page = EditPage {
            session,
            line_count: line_numbers.len(),
            line_numbers,
            saved,
        };
        self.tera.render("edit.html", &Context::from_serialize(page)?)
    }
}

/// Right-aligned gutter labels, one per line of `text`.
pub fn line_numbers(text: &str) -> Vec<String> {
    (1..=text.lines().count())
        .map(|number| format!("{:>3}", number))
        .collect()
}
