use device_map::config::CONFIG_ELEMENT_ID;
use device_map::Config;

/// Embed the viewer configuration into the viewer's `index.html`.
///
/// The config is placed in a JSON script element right before `</head>`, or
/// prepended when the page has no head.
pub fn inject_config(index_html: &str, config: &Config) -> Result<String, serde_json::Error> {
    // A literal "</" would end the script element early.
    let json = serde_json::to_string(config)?.replace("</", "<\\/");
    let element =
        format!(r#"<script id="{CONFIG_ELEMENT_ID}" type="application/json">{json}</script>"#);

    Ok(match index_html.find("</head>") {
        Some(pos) => {
            let mut html = String::with_capacity(index_html.len() + element.len());
            html.push_str(&index_html[..pos]);
            html.push_str(&element);
            html.push_str(&index_html[pos..]);
            html
        }
        None => format!("{element}{index_html}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_before_head_end() {
        let page = "<html><head><title>x</title></head><body></body></html>";
        let html = inject_config(page, &Config::default()).unwrap();
        let script = html.find("<script id=\"device-map-config\"").unwrap();
        assert!(script < html.find("</head>").unwrap());
        assert!(html.contains(r#""api_root":"/api""#));
    }

    #[test]
    fn test_inject_without_head() {
        let html = inject_config("<div></div>", &Config::default()).unwrap();
        assert!(html.starts_with("<script"));
        assert!(html.ends_with("<div></div>"));
    }

    #[test]
    fn test_script_end_is_escaped() {
        let config = Config {
            tile_attribution: "</script><b>x</b>".to_string(),
            ..Config::default()
        };
        let html = inject_config("<head></head>", &config).unwrap();
        assert_eq!(html.matches("</script>").count(), 1);
        assert!(html.contains(r"<\/script><b>x<\/b>"));

        let start = html.find('>').unwrap() + 1;
        let end = html.find("</script>").unwrap();
        let parsed = Config::from_json(&html[start..end]).unwrap();
        assert_eq!(parsed, config);
    }
}
