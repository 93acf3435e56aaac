//! Bar chart of one numeric column.

use leptos::*;

use crate::BarChart;

#[component]
pub fn BarChartView(chart: BarChart) -> impl IntoView {
    let heights: Vec<(String, Option<f64>, f64)> = chart
        .bars
        .iter()
        .map(|bar| {
            let height = bar.value.map(|v| chart.height_percent(v)).unwrap_or(0.0);
            (bar.label.clone(), bar.value, height)
        })
        .collect();

    view! {
        <div class="chart">
            <div class="chart-title">"📊 " {chart.column.clone()}</div>
            <div class="chart-bars">
                {heights
                    .into_iter()
                    .map(|(label, value, height)| {
                        let title = match value {
                            Some(v) => format!("{}: {}", label, v),
                            None => format!("{}: missing", label),
                        };
                        view! {
                            <div class="chart-bar-slot" title=title>
                                <div
                                    class="chart-bar"
                                    class:negative=value.map(|v| v < 0.0).unwrap_or(false)
                                    class:missing=value.is_none()
                                    style=format!("height: {:.1}%", height)
                                ></div>
                                <div class="chart-label">{label}</div>
                            </div>
                        }
                    })
                    .collect_view()}
            </div>
        </div>
    }
}
