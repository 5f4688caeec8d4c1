//! The compiled static site.

use std::path::{Path, PathBuf};

use askama::Template;
use tracing::info;

use crate::config::SiteConfig;
use crate::error::WebError;

/// Name of the loader script in the bundle.
pub const SCRIPT_NAME: &str = "app.js";

/// Fetches the photo list once and cycles the slides. Reads its settings from
/// `window.PHOTOSTACK`.
const LOADER_SCRIPT: &str = r#"(function () {
  var cfg = window.PHOTOSTACK;
  var root = document.getElementById("carousel");
  function render(photos) {
    root.innerHTML = "";
    photos.forEach(function (photo, i) {
      var item = document.createElement("div");
      item.className = "carousel-item" + (i === 0 ? " active" : "");
      var img = document.createElement("img");
      img.src = photo.url;
      img.alt = photo.filename;
      var caption = document.createElement("div");
      caption.className = "carousel-caption";
      var title = document.createElement("h3");
      title.textContent = photo.filename;
      caption.appendChild(title);
      item.appendChild(img);
      item.appendChild(caption);
      root.appendChild(item);
    });
    if (photos.length < 2) return;
    var current = 0;
    setInterval(function () {
      root.children[current].classList.remove("active");
      current = (current + 1) % photos.length;
      root.children[current].classList.add("active");
    }, cfg.intervalMs);
  }
  fetch(cfg.apiBase + "getAllPhotos")
    .then(function (res) {
      if (!res.ok) throw new Error("HTTP " + res.status);
      return res.json();
    })
    .then(render)
    .catch(function (err) {
      console.warn("failed to load photos", err);
      render([]);
    });
})();
"#;

/// Paths of a written bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteBundle {
    /// Bundle root.
    pub out_dir: PathBuf,
    /// Every file written, relative to `out_dir`.
    pub files: Vec<String>,
}

impl SiteBundle {
    /// Write `index.html` and the loader script into `out_dir`, creating it
    /// if needed.
    pub fn build(config: &SiteConfig, out_dir: &Path) -> Result<Self, WebError> {
        std::fs::create_dir_all(out_dir).map_err(|source| WebError::Io {
            path: out_dir.to_path_buf(),
            source,
        })?;

        let files = [
            ("index.html", render_index(config)?),
            (SCRIPT_NAME, LOADER_SCRIPT.to_owned()),
        ];
        for (name, contents) in &files {
            let path = out_dir.join(name);
            std::fs::write(&path, contents).map_err(|source| WebError::Io { path, source })?;
        }

        info!(out_dir = %out_dir.display(), api_base = %config.api_base, "built site bundle");
        Ok(Self {
            out_dir: out_dir.to_path_buf(),
            files: files.iter().map(|(name, _)| (*name).to_owned()).collect(),
        })
    }
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate<'a> {
    title: &'a str,
    settings: String,
    script: &'a str,
}

/// Render the page shell with `config` baked in.
pub fn render_index(config: &SiteConfig) -> Result<String, WebError> {
    // `</` must not appear inside an inline script.
    let settings = serde_json::to_string(config)?.replace("</", "<\\/");
    let page = IndexTemplate {
        title: &config.title,
        settings,
        script: SCRIPT_NAME,
    };
    Ok(page.render()?)
}
