//! # Catalog View
//!
//! Renders catalog lists and single movies for the terminal, either as an
//! aligned table for people or as JSON lines for scripts.

use crate::catalog::{CatalogList, CatalogSource, Movie, PosterRef, ReachabilityState};
use anyhow::Result;
use serde_json::json;
use std::io::Write;

/// Longest overview shown in list mode before truncation
const OVERVIEW_PREVIEW_CHARS: usize = 96;

/// How lists are written to the output stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    JsonLines,
}

impl OutputFormat {
    /// Table for terminals, JSON lines when piped or when asked for
    pub fn detect(force_json: bool) -> Self {
        if force_json || !atty::is(atty::Stream::Stdout) {
            OutputFormat::JsonLines
        } else {
            OutputFormat::Table
        }
    }
}

/// Writes catalog output to a stream
pub struct CatalogRenderer<W: Write> {
    out: W,
    format: OutputFormat,
    image_base: String,
}

impl<W: Write> CatalogRenderer<W> {
    pub fn new(out: W, format: OutputFormat, image_base: &str) -> Self {
        Self {
            out,
            format,
            image_base: image_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn poster_text(&self, poster: Option<&PosterRef>) -> String {
        match poster {
            Some(PosterRef::Url(path)) => {
                format!("{}/{}", self.image_base, path.trim_start_matches('/'))
            }
            Some(PosterRef::Image(bytes)) => format!("[embedded poster, {} bytes]", bytes.len()),
            None => "-".to_string(),
        }
    }

    fn poster_json(&self, poster: Option<&PosterRef>) -> serde_json::Value {
        match poster {
            Some(PosterRef::Url(_)) => json!(self.poster_text(poster)),
            Some(PosterRef::Image(bytes)) => json!({ "embedded_bytes": bytes.len() }),
            None => serde_json::Value::Null,
        }
    }

    fn movie_json(&self, movie: &Movie) -> serde_json::Value {
        json!({
            "id": movie.id(),
            "title": movie.title(),
            "overview": movie.overview(),
            "release_date": movie.release_date(),
            "vote_average": movie.vote_average(),
            "poster": self.poster_json(movie.poster()),
        })
    }

    pub fn render_list(&mut self, list: &CatalogList) -> Result<()> {
        match self.format {
            OutputFormat::JsonLines => {
                for movie in list {
                    let line = serde_json::to_string(&self.movie_json(movie))?;
                    writeln!(self.out, "{line}")?;
                }
            }
            OutputFormat::Table => {
                if list.is_empty() {
                    writeln!(self.out, "No upcoming movies.")?;
                }
                for movie in list {
                    writeln!(
                        self.out,
                        "{:>8}  {:>4.1}  {:<10}  {}",
                        movie.id(),
                        movie.vote_average(),
                        movie.release_date().unwrap_or("-"),
                        movie.title().unwrap_or("(untitled)")
                    )?;
                    if !movie.overview().is_empty() {
                        writeln!(self.out, "{:26}{}", "", preview(movie.overview()))?;
                    }
                }
            }
        }
        self.out.flush()?;
        Ok(())
    }

    pub fn render_movie(&mut self, movie: &Movie) -> Result<()> {
        match self.format {
            OutputFormat::JsonLines => {
                let line = serde_json::to_string(&self.movie_json(movie))?;
                writeln!(self.out, "{line}")?;
            }
            OutputFormat::Table => {
                writeln!(self.out, "{}", movie.title().unwrap_or("(untitled)"))?;
                writeln!(self.out, "  id:       {}", movie.id())?;
                writeln!(self.out, "  released: {}", movie.release_date().unwrap_or("-"))?;
                writeln!(self.out, "  score:    {:.1}", movie.vote_average())?;
                writeln!(self.out, "  poster:   {}", self.poster_text(movie.poster()))?;
                if !movie.overview().is_empty() {
                    writeln!(self.out)?;
                    writeln!(self.out, "{}", movie.overview())?;
                }
            }
        }
        self.out.flush()?;
        Ok(())
    }

    pub fn render_status(&mut self, status: ReachabilityState, addr: &str) -> Result<()> {
        match self.format {
            OutputFormat::JsonLines => {
                let line = json!({ "status": status.to_string(), "host": addr });
                writeln!(self.out, "{line}")?;
            }
            OutputFormat::Table => writeln!(self.out, "{addr}: {status}")?,
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Line for the offline indicator, if one should be shown
pub fn offline_notice(status: ReachabilityState, source: CatalogSource) -> Option<&'static str> {
    match (status, source) {
        (ReachabilityState::Unsatisfied, CatalogSource::Cache) => {
            Some("You are offline: showing the last saved catalog.")
        }
        (ReachabilityState::Satisfied, CatalogSource::Cache) => {
            Some("Catalog unavailable: showing the last saved catalog.")
        }
        (ReachabilityState::Unsatisfied, CatalogSource::Empty) => {
            Some("You are offline and no saved catalog exists yet.")
        }
        _ => None,
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= OVERVIEW_PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(OVERVIEW_PREVIEW_CHARS - 1).collect();
    format!("{}…", cut.trim_end())
}
