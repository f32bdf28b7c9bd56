use catalog::MarkerRegistry;
use scene::picking::PickResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelField {
    pub label: &'static str,
    pub value: String,
}

/// Everything the info panel shows for one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelContent {
    pub title: String,
    pub fact: String,
    /// Labelled rows in display order. Empty values keep their row.
    pub fields: Vec<PanelField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RenderInstruction {
    #[default]
    Hide,
    Show(PanelContent),
}

pub struct InfoPanelPresenter;

impl InfoPanelPresenter {
    pub fn present(pick: PickResult, registry: &MarkerRegistry) -> RenderInstruction {
        let Some(id) = pick.region() else {
            return RenderInstruction::Hide;
        };
        let Some(region) = registry.region(id) else {
            tracing::warn!(%id, "pick refers to a region missing from the registry");
            return RenderInstruction::Hide;
        };

        RenderInstruction::Show(PanelContent {
            title: region.name.clone(),
            fact: region.fact.clone(),
            fields: vec![
                PanelField {
                    label: "Extent",
                    value: region.extent.clone(),
                },
                PanelField {
                    label: "Countries",
                    value: region.countries.join(", "),
                },
                PanelField {
                    label: "Key species",
                    value: region.species.clone(),
                },
                PanelField {
                    label: "Deforestation",
                    value: region.deforestation_trend.clone(),
                },
            ],
        })
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

impl PanelContent {
    /// Panel markup: bold title, italic fact, a rule, then the labelled rows.
    pub fn to_html(&self) -> String {
        let mut html = String::from(
            "<div style=\"font-family: Arial, sans-serif; font-size: 13px; max-width: 250px; line-height: 1.4;\">",
        );
        html.push_str(&format!(
            "<b style=\"font-size: 14px;\">{}</b><br><em>{}</em>",
            escape_html(&self.title),
            escape_html(&self.fact)
        ));
        html.push_str("<hr style=\"margin: 6px 0; border: 0; border-top: 1px solid #ccc;\">");
        let rows: Vec<String> = self
            .fields
            .iter()
            .map(|f| format!("<b>{}:</b> {}", escape_html(f.label), escape_html(&f.value)))
            .collect();
        html.push_str(&rows.join("<br>"));
        html.push_str("</div>");
        html
    }

    pub fn to_plain_text(&self) -> String {
        let mut out = format!("{}\n{}\n", self.title, self.fact);
        for f in &self.fields {
            out.push_str(&format!("{}: {}\n", f.label, f.value));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{InfoPanelPresenter, PanelContent, PanelField, RenderInstruction};
    use catalog::{MarkerRegistry, Region};
    use foundation::ids::RegionId;
    use pretty_assertions::assert_eq;
    use scene::picking::PickResult;

    fn hit(i: u32) -> PickResult {
        PickResult::Hit {
            region: RegionId::new(i),
            distance: 1.0,
        }
    }

    #[test]
    fn none_hides() {
        let registry = MarkerRegistry::load().unwrap();
        assert_eq!(
            InfoPanelPresenter::present(PickResult::None, &registry),
            RenderInstruction::Hide
        );
    }

    #[test]
    fn hit_shows_fields_in_order() {
        let registry = MarkerRegistry::load().unwrap();
        let RenderInstruction::Show(content) = InfoPanelPresenter::present(hit(8), &registry) else {
            panic!("expected panel");
        };
        assert_eq!(content.title, "Atlantic Forest (Mata Atlântica)");
        let labels: Vec<&str> = content.fields.iter().map(|f| f.label).collect();
        assert_eq!(labels, vec!["Extent", "Countries", "Key species", "Deforestation"]);
        assert_eq!(
            content.fields[1].value,
            "Brazil (86%), Argentina (9.5%), Paraguay (4%)"
        );
    }

    #[test]
    fn empty_fields_keep_their_label() {
        let registry = MarkerRegistry::from_regions(vec![Region {
            name: "Sparse".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            extent: String::new(),
            countries: vec!["Nowhere".to_string()],
            species: String::new(),
            fact: String::new(),
            deforestation_trend: String::new(),
        }])
        .unwrap();
        let RenderInstruction::Show(content) = InfoPanelPresenter::present(hit(0), &registry) else {
            panic!("expected panel");
        };
        assert_eq!(
            content.fields[0],
            PanelField {
                label: "Extent",
                value: String::new()
            }
        );
        assert!(content.to_plain_text().contains("Key species: \n"));
    }

    #[test]
    fn unknown_region_hides() {
        let registry = MarkerRegistry::load().unwrap();
        assert_eq!(InfoPanelPresenter::present(hit(99), &registry), RenderInstruction::Hide);
    }

    #[test]
    fn html_is_escaped() {
        let content = PanelContent {
            title: "A & B".to_string(),
            fact: "<script>".to_string(),
            fields: vec![PanelField {
                label: "Extent",
                value: "\"big\"".to_string(),
            }],
        };
        let html = content.to_html();
        assert!(html.contains("<b style=\"font-size: 14px;\">A &amp; B</b>"));
        assert!(html.contains("<em>&lt;script&gt;</em>"));
        assert!(html.contains("<b>Extent:</b> &quot;big&quot;"));
        assert!(!html.contains("<script>"));
    }
}
