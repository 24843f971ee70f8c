use std::io::{self, Write};

use chrono::Utc;
use serde_json::Value;

use super::config::{OutputConfig, OutputFormat};
use super::types::Envelope;
use crate::util::time::{format_time_ago, parse_published};

pub trait Presenter: Send + Sync {
    fn emit(&self, env: &Envelope, w: &mut dyn Write) -> io::Result<()>;
}

pub struct JsonPresenter { pub pretty: bool }
impl Presenter for JsonPresenter {
    fn emit(&self, env: &Envelope, w: &mut dyn Write) -> io::Result<()> {
        if self.pretty { serde_json::to_writer_pretty(&mut *w, env).map_err(to_io)? } else { serde_json::to_writer(&mut *w, env).map_err(to_io)? }
        writeln!(w)
    }
}

/// Human rendering: article listings get one card per article, everything
/// else falls back to `key: value` lines (or pretty JSON when asked).
pub struct TextPresenter { pub pretty: bool }
impl Presenter for TextPresenter {
    fn emit(&self, env: &Envelope, w: &mut dyn Write) -> io::Result<()> {
        let (label, payload) = if env.apply { ("Result", &env.result) } else { ("Plan", &env.plan) };
        writeln!(w, "{}: {}", label, env.op)?;
        let Some(payload) = payload else { return Ok(()) };
        if self.pretty {
            serde_json::to_writer_pretty(&mut *w, payload).map_err(to_io)?;
            return writeln!(w);
        }
        match payload.get("articles").and_then(Value::as_array) {
            Some(articles) => {
                for a in articles { write_article(w, a)?; }
                write_fields(w, payload, &["articles"])
            }
            None => write_fields(w, payload, &[]),
        }
    }
}

fn write_article(w: &mut dyn Write, a: &Value) -> io::Result<()> {
    let id = a.get("_id").and_then(Value::as_str).unwrap_or("?");
    let title = a.get("title").and_then(Value::as_str).unwrap_or("(untitled)");
    let likes = a.get("like_count").and_then(Value::as_u64).unwrap_or(0);
    let heart = if a.get("is_liked").and_then(Value::as_bool).unwrap_or(false) { "♥" } else { "♡" };
    writeln!(w, "  [{id}] {title}")?;

    let mut meta: Vec<String> = Vec::new();
    if let Some(source) = a.get("source").and_then(Value::as_str) { meta.push(source.to_string()); }
    if let Some(ts) = a.get("publishedAt").and_then(Value::as_str).and_then(parse_published) {
        meta.push(format_time_ago(ts, Utc::now()));
    }
    let tags: Vec<&str> = a.get("tags").and_then(Value::as_array)
        .map(|t| t.iter().filter_map(Value::as_str).take(3).collect())
        .unwrap_or_default();
    if !tags.is_empty() { meta.push(format!("#{}", tags.join(" #"))); }
    meta.push(format!("{heart} {likes}"));
    writeln!(w, "      {}", meta.join(" · "))
}

fn write_fields(w: &mut dyn Write, payload: &Value, skip: &[&str]) -> io::Result<()> {
    match payload {
        Value::Object(map) => {
            for (k, v) in map.iter().filter(|(k, _)| !skip.contains(&k.as_str())) {
                match v {
                    Value::String(s) => writeln!(w, "  {k}: {s}")?,
                    other => writeln!(w, "  {k}: {other}")?,
                }
            }
            Ok(())
        }
        other => writeln!(w, "  {other}"),
    }
}

pub struct Emitter {
    presenter: Box<dyn Presenter>,
}

impl Emitter {
    pub fn from_config(cfg: OutputConfig) -> Self {
        let presenter: Box<dyn Presenter> = match cfg.format {
            OutputFormat::Json => Box::new(JsonPresenter { pretty: cfg.pretty }),
            OutputFormat::Text => Box::new(TextPresenter { pretty: cfg.pretty }),
        };
        Emitter { presenter }
    }

    pub fn emit(&self, env: &Envelope) -> io::Result<()> {
        let mut out = io::stdout();
        self.presenter.emit(env, &mut out)?;
        out.flush()
    }
}

fn to_io(e: serde_json::Error) -> io::Error { io::Error::new(io::ErrorKind::Other, e) }
