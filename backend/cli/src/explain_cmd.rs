//! One-shot explanation of a diagram file.

use std::path::Path;

use anyhow::Result;
use diagramlens_config::DiagramLensConfig;
use diagramlens_core::Explanation;
use markdown::Renderer;

use crate::app;
use crate::OutputFormat;

pub async fn run(config: &DiagramLensConfig, image_path: &Path, format: OutputFormat) -> Result<()> {
    let tutor = app::build_tutor(config)?;
    let image = app::load_image(image_path, config.max_upload_bytes()).await?;
    let explanation = tutor.explain(&image).await?;
    println!("{}", render(&explanation, format)?);
    Ok(())
}

pub fn render(explanation: &Explanation, format: OutputFormat) -> Result<String> {
    let blocks = markdown::parse(&explanation.to_markdown());
    Ok(match format {
        OutputFormat::Ansi => Renderer::to_ansi(&blocks),
        OutputFormat::Plain => Renderer::to_plain_text(&blocks),
        OutputFormat::Html => Renderer::to_html(&blocks),
        OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
            "explanation": explanation,
            "blocks": blocks,
        }))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagramlens_core::DiagramComponent;

    fn explanation() -> Explanation {
        Explanation {
            title: "Cache <layer>".into(),
            summary: "Reads hit the **cache** first.".into(),
            components: vec![DiagramComponent {
                name: "Cache".into(),
                description: "Holds hot keys.".into(),
            }],
            relationships: vec!["Misses fall through to the database.".into()],
            key_takeaways: vec![],
        }
    }

    #[test]
    fn renders_each_format() {
        let e = explanation();

        let plain = render(&e, OutputFormat::Plain).unwrap();
        assert!(plain.starts_with("Cache <layer>"));
        assert!(plain.contains("Reads hit the cache first."));
        assert!(plain.contains("1. Misses fall through"));

        let html = render(&e, OutputFormat::Html).unwrap();
        assert!(html.contains("<h2>Cache &lt;layer&gt;</h2>"));
        assert!(html.contains("<strong>cache</strong>"));

        let ansi = render(&e, OutputFormat::Ansi).unwrap();
        assert!(ansi.contains("\x1b[1m"));

        let json: serde_json::Value =
            serde_json::from_str(&render(&e, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["explanation"]["title"], "Cache <layer>");
        assert_eq!(json["blocks"][0]["kind"], "heading");
    }
}
