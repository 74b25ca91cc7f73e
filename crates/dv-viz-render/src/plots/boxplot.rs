use dv_viz::BoxPlotArtifact;

use crate::canvas::Canvas;
use crate::config::VizConfig;
use crate::layout::axes::Axis;
use crate::layout::legend::{self, LegendEntry};
use crate::layout::margins::PlotArea;
use crate::plots::axes_draw::draw_axes;
use crate::primitives::*;

/// Gap left between neighbouring boxes, as a fraction of each box slot.
const BOX_GAP: f64 = 0.1;

pub fn render(artifact: &BoxPlotArtifact, config: &VizConfig) -> crate::Result<String> {
    if artifact.groups.is_empty() {
        return Ok(empty_svg());
    }

    let mut canvas = Canvas::new(config.figure.width, config.figure.height)?;

    let (lo, hi) = artifact.value_range();
    if !lo.is_finite() || !hi.is_finite() {
        return Err(crate::RenderError::Layout(format!("non-finite value range [{lo}, {hi}]")));
    }
    let pad = (hi - lo) * 0.05;
    let y_axis = Axis::auto_linear(lo - pad, hi + pad, 6).with_label(artifact.y_label.as_str());
    let x_axis = Axis::categorical(&artifact.categories).with_label(artifact.x_label.as_str());

    let area = PlotArea::auto(&canvas, &y_axis, &x_axis, config);
    draw_axes(&mut canvas, &area, &x_axis, &y_axis, config);

    let palette = config.palette_colors();
    let color_of = |method: usize| palette[method % palette.len()];
    let x_px = |v: f64| x_axis.data_to_pixel(v, area.left, area.right());
    let y_px = |v: f64| y_axis.data_to_pixel(v, area.bottom(), area.top);

    let n_methods = artifact.methods.len().max(1);
    let group_width = config.boxplot.group_width;
    let slot = group_width / n_methods as f64;
    let box_w = slot * (1.0 - BOX_GAP) * x_axis.scale(area.left, area.right());
    let whisker_style = LineStyle::solid(config.colors.whisker, 0.9);
    let median_style = LineStyle::solid(config.colors.median, 1.4);

    for group in &artifact.groups {
        let s = &group.stats;
        let center = group.category as f64 - group_width / 2.0 + (group.method as f64 + 0.5) * slot;
        let cx = x_px(center);
        let fill = color_of(group.method);

        canvas.begin_group("box");
        canvas.error_bar(
            cx,
            y_px(s.whisker_low),
            y_px(s.whisker_high),
            box_w * config.boxplot.cap_fraction,
            &whisker_style,
        );
        let (top, bottom) = (y_px(s.q3), y_px(s.q1));
        canvas.rect(
            cx - box_w / 2.0,
            top,
            box_w,
            (bottom - top).max(0.5),
            &Style::outlined(fill, config.colors.whisker, 0.9),
        );
        let ym = y_px(s.median);
        canvas.line(cx - box_w / 2.0, ym, cx + box_w / 2.0, ym, &median_style);
        if config.boxplot.show_means {
            canvas.marker(
                cx,
                y_px(s.mean),
                &MarkerStyle { size: 2.5, color: config.colors.median, fill: true },
            );
        }
        let outlier_style =
            MarkerStyle { size: config.boxplot.outlier_size, color: config.colors.outlier, fill: false };
        for &v in &s.outliers {
            canvas.marker(cx, y_px(v), &outlier_style);
        }
        canvas.end_group();
    }

    // True effect, drawn over the boxes across the whole x range.
    if let Some(reference) = artifact.reference {
        let py = y_px(reference);
        let style = LineStyle::solid(
            config.colors.reference.with_alpha(config.boxplot.reference_opacity),
            config.boxplot.reference_width,
        );
        canvas.begin_group("reference");
        canvas.line(area.left, py, area.right(), py, &style);
        canvas.end_group();
    }

    if config.legend.show {
        let entries: Vec<LegendEntry> = artifact
            .methods
            .iter()
            .enumerate()
            .map(|(i, m)| LegendEntry { label: m.clone(), color: color_of(i) })
            .collect();
        legend::draw_legend(&mut canvas, &area, &entries, config.font.size, config.legend.frame);
    }

    tracing::debug!(
        boxes = artifact.groups.len(),
        categories = artifact.categories.len(),
        methods = artifact.methods.len(),
        "rendered box plot"
    );
    Ok(canvas.finish_svg())
}

fn empty_svg() -> String {
    r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50"><text x="10" y="30">No estimates</text></svg>"#.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use dv_inference::ResultRow;

    fn rows() -> Vec<ResultRow> {
        let mut rows = Vec::new();
        for affected in ["outcome", "outcome_and_treatment"] {
            for method in ["backdoor.linear_regression", "backdoor.propensity_score_matching"] {
                for i in 0..20 {
                    rows.push(ResultRow {
                        value: 10.0 + (i as f64 - 10.0) * 0.05,
                        method: method.into(),
                        affected: affected.into(),
                    });
                }
            }
        }
        rows
    }

    fn count(svg: &str, needle: &str) -> usize {
        svg.matches(needle).count()
    }

    #[test]
    fn one_box_per_group_and_reference_line() {
        let art = BoxPlotArtifact::from_rows(&rows(), Some(10.0)).unwrap();
        let svg = render(&art, &VizConfig::default()).unwrap();
        assert_eq!(count(&svg, r#"<g class="box">"#), 4);
        assert_eq!(count(&svg, r#"<g class="reference">"#), 1);
        assert!(svg.contains(r#"stroke="rgba(128,128,128,0.500)""#));
        assert!(svg.contains("Affected variables"));
        assert!(svg.contains("Estimated treatment effect"));
        assert!(svg.contains("outcome and treatment"));
    }

    #[test]
    fn legend_uses_palette_in_method_order() {
        let art = BoxPlotArtifact::from_rows(&rows(), None).unwrap();
        let config = VizConfig::default();
        let svg = render(&art, &config).unwrap();
        assert_eq!(count(&svg, r#"<g class="reference">"#), 0);
        let legend = &svg[svg.find(r#"<g class="legend">"#).unwrap()..];
        let first = legend.find("linear_regression").unwrap();
        let second = legend.find("propensity_score_matching").unwrap();
        assert!(first < second);
        let palette = config.palette_colors();
        let c0 = format!(r#"fill="{}""#, palette[0].to_svg_fill());
        let c1 = format!(r#"fill="{}""#, palette[1].to_svg_fill());
        assert!(legend.find(&c0).unwrap() < legend.find(&c1).unwrap());
    }

    #[test]
    fn outliers_and_legend_toggle() {
        let mut rows = rows();
        rows.push(ResultRow {
            value: 40.0,
            method: "backdoor.linear_regression".into(),
            affected: "outcome".into(),
        });
        let art = BoxPlotArtifact::from_rows(&rows, Some(10.0)).unwrap();
        let mut config = VizConfig::default();
        config.legend.show = false;
        config.colors.outlier = Color::rgb(1, 2, 3);
        let svg = render(&art, &config).unwrap();
        assert_eq!(count(&svg, r##"<circle"##), 1);
        assert!(svg.contains(r##"stroke="#010203""##));
        assert!(!svg.contains(r#"<g class="legend">"#));
    }

    #[test]
    fn empty_artifact() {
        let art = BoxPlotArtifact {
            categories: Vec::new(),
            methods: Vec::new(),
            groups: Vec::new(),
            reference: None,
            x_label: String::new(),
            y_label: String::new(),
        };
        let svg = render(&art, &VizConfig::default()).unwrap();
        assert!(svg.contains("No estimates"));
    }
}
