use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Blocos executáveis são removidos com o conteúdo
    static ref EXECUTABLE_BLOCK: Regex =
        Regex::new(r"(?is)<\s*(script|style|iframe|object)\b[^>]*>.*?<\s*/\s*(script|style|iframe|object)\s*>")
            .expect("regex de blocos executáveis");
    static ref ANY_TAG: Regex = Regex::new(r"(?s)<[^>]*>").expect("regex de tags");
    static ref JS_SCHEME: Regex = Regex::new(r"(?i)javascript\s*:").expect("regex de javascript:");
}

/// Limpa um texto livre vindo do cliente: remove marcação executável e tags,
/// depois apara espaços nas pontas.
pub fn sanitize_text(raw: &str) -> String {
    let without_blocks = EXECUTABLE_BLOCK.replace_all(raw, "");
    let without_tags = ANY_TAG.replace_all(&without_blocks, "");
    let cleaned = JS_SCHEME.replace_all(&without_tags, "");
    cleaned.trim().to_string()
}

/// Igual a `sanitize_text`, mas devolve `None` quando não sobra nada.
pub fn sanitize_opt(raw: Option<&str>) -> Option<String> {
    raw.map(sanitize_text).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_plain_text() {
        assert_eq!(sanitize_text("  Bebidas  "), "Bebidas");
    }

    #[test]
    fn strips_script_blocks_with_content() {
        assert_eq!(sanitize_text("Snacks<script>alert('x')</script>"), "Snacks");
        assert_eq!(sanitize_text("<SCRIPT src=x>\nalert(1)\n</SCRIPT>Dulces"), "Dulces");
    }

    #[test]
    fn strips_tags_but_keeps_text() {
        assert_eq!(sanitize_text("<b>Combo</b> <i>grande</i>"), "Combo grande");
    }

    #[test]
    fn strips_javascript_scheme() {
        assert_eq!(sanitize_text("javascript:alert(1)"), "alert(1)");
    }

    #[test]
    fn keeps_accents_and_symbols() {
        assert_eq!(sanitize_text("Categoría & más"), "Categoría & más");
    }

    #[test]
    fn sanitize_opt_drops_empty_results() {
        assert_eq!(sanitize_opt(Some("<script>x</script>")), None);
        assert_eq!(sanitize_opt(None), None);
        assert_eq!(sanitize_opt(Some(" Litro ")), Some("Litro".to_string()));
    }
}
