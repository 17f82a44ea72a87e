use std::sync::Arc;

use tera::Tera;

/// All pages ship inside the binary so a deploy stays a single artifact.
/// Tera autoescapes `.html` names, so every user-entered value is safe to
/// interpolate directly.
pub fn init_templates() -> Result<Arc<Tera>, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("site/index.html", include_str!("../../../templates/site/index.html")),
        ("site/car.html", include_str!("../../../templates/site/car.html")),
        ("admin/login.html", include_str!("../../../templates/admin/login.html")),
        ("admin/index.html", include_str!("../../../templates/admin/index.html")),
        ("admin/leads.html", include_str!("../../../templates/admin/leads.html")),
    ])?;

    Ok(Arc::new(tera))
}

#[cfg(test)]
mod tests {
    use super::init_templates;

    #[test]
    fn bundled_templates_register_cleanly() {
        let tera = init_templates().expect("bundled templates should parse");
        let names: Vec<&str> = tera.get_template_names().collect();
        assert!(names.contains(&"site/index.html"));
        assert!(names.contains(&"admin/leads.html"));
    }
}
