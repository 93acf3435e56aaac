//! Per-file card: metadata, preview, cleaning, column selection,
//! visualization and conversion.

use leptos::*;

use crate::components::{add_log, BarChartView};
use crate::services::{save_download, ApiClient};
use crate::{
    cell_text, CleanResponse, FileSummary, LogEntry, LogLevel, OutputFormat, TablePreview,
    PREVIEW_ROWS,
};

/// Replace a file's summary in the list, matched by id.
fn replace_summary(set_files: WriteSignal<Vec<FileSummary>>, summary: FileSummary) {
    set_files.update(|files| {
        if let Some(slot) = files.iter_mut().find(|f| f.id == summary.id) {
            *slot = summary;
        }
    });
}

/// Preview of the first rows.
#[component]
pub fn DataTable(#[prop(into)] preview: Signal<TablePreview>) -> impl IntoView {
    view! {
        <table class="data-table">
            <thead>
                <tr>
                    {move || preview.get().columns.into_iter().map(|c| view! { <th>{c}</th> }).collect_view()}
                </tr>
            </thead>
            <tbody>
                {move || {
                    preview
                        .get()
                        .rows
                        .into_iter()
                        .map(|row| {
                            view! {
                                <tr>
                                    {row.iter().map(|cell| view! { <td>{cell_text(cell)}</td> }).collect_view()}
                                </tr>
                            }
                        })
                        .collect_view()
                }}
            </tbody>
        </table>
    }
}

#[component]
pub fn FileCard(
    client: ApiClient,
    #[prop(into)] file: Signal<FileSummary>,
    set_files: WriteSignal<Vec<FileSummary>>,
    set_logs: WriteSignal<Vec<LogEntry>>,
) -> impl IntoView {
    let client = store_value(client);
    let file_id = store_value(file.get_untracked().id);

    let (busy, set_busy) = create_signal(false);
    let (show_clean, set_show_clean) = create_signal(false);
    let (show_chart, set_show_chart) = create_signal(false);
    let (chart_column, set_chart_column) = create_signal(None::<String>);
    let (format, set_format) = create_signal(OutputFormat::Csv);

    let name = move || file.get().name;

    // Cleaning commands
    let run_clean = move |dedup: bool| {
        let client = client.get_value();
        let id = file_id.get_value();
        spawn_local(async move {
            set_busy.set(true);
            let result: Result<CleanResponse, _> = if dedup {
                client.deduplicate(&id).await
            } else {
                client.impute(&id).await
            };
            match result {
                Ok(response) => {
                    add_log(
                        set_logs,
                        LogLevel::Success,
                        &format!("🧹 {}: {}", response.file.name, response.report.describe()),
                    );
                    replace_summary(set_files, response.file);
                }
                Err(e) => add_log(set_logs, LogLevel::Error, &format!("❌ {}", e)),
            }
            set_busy.set(false);
        });
    };

    // Column selection; `None` resets to every column
    let send_selection = move |columns: Option<Vec<String>>| {
        let client = client.get_value();
        let id = file_id.get_value();
        spawn_local(async move {
            match client.set_columns(&id, columns).await {
                Ok(summary) => replace_summary(set_files, summary),
                Err(e) => add_log(set_logs, LogLevel::Error, &format!("❌ {}", e)),
            }
        });
    };

    // Kept in table order
    let toggle_column = move |column: String, checked: bool| {
        let current = file.get_untracked();
        let next: Vec<String> = current
            .columns
            .iter()
            .map(|c| c.name.clone())
            .filter(|n| if *n == column { checked } else { current.selection.contains(n) })
            .collect();
        if next.is_empty() {
            add_log(
                set_logs,
                LogLevel::Warning,
                &format!("⚠️ {}: no column selected, the output will be empty", current.name),
            );
        }
        send_selection(Some(next));
    };

    // Chart data follows the toggle, the chosen column and the file state
    let chart = create_local_resource(
        move || (show_chart.get(), chart_column.get(), file.get()),
        move |(show, column, _)| {
            let client = client.get_value();
            let id = file_id.get_value();
            async move {
                if !show {
                    return None;
                }
                Some(client.chart(&id, column.as_deref()).await.map_err(|e| e.to_string()))
            }
        },
    );

    let on_convert = move |_| {
        let client = client.get_value();
        let id = file_id.get_value();
        let target = format.get_untracked();
        spawn_local(async move {
            set_busy.set(true);
            match client.convert(&id, target).await {
                Ok(download) => match save_download(&download) {
                    Ok(()) => add_log(
                        set_logs,
                        LogLevel::Success,
                        &format!("🎉 Converted to {} as {}", target.label(), download.file_name),
                    ),
                    Err(e) => add_log(set_logs, LogLevel::Error, &format!("❌ {}", e)),
                },
                Err(e) => add_log(set_logs, LogLevel::Error, &format!("❌ {}", e)),
            }
            set_busy.set(false);
        });
    };

    let on_remove = move |_| {
        let client = client.get_value();
        let id = file_id.get_value();
        spawn_local(async move {
            match client.remove(&id).await {
                Ok(()) => set_files.update(|files| files.retain(|f| f.id != id)),
                Err(e) => add_log(set_logs, LogLevel::Error, &format!("❌ {}", e)),
            }
        });
    };

    let format_radio = move |value: OutputFormat| {
        view! {
            <label class="radio">
                <input
                    type="radio"
                    name=move || format!("format-{}", file_id.get_value())
                    prop:checked=move || format.get() == value
                    on:change=move |_| set_format.set(value)
                />
                {value.label()}
            </label>
        }
    };

    view! {
        <div class="file-card">
            <div class="file-card-header">
                <div>
                    <div class="file-name"><strong>"File Name: "</strong> {name}</div>
                    <div class="file-meta">
                        <strong>"File Size: "</strong> {move || file.get().size_label}
                        " • " {move || file.get().row_count} " rows"
                        " • " {move || file.get().columns.len()} " columns"
                        {move || file.get().encoding.map(|e| format!(" • {}", e))}
                        {move || file.get().delimiter.map(|d| format!(" • delimiter '{}'", d))}
                        {move || file.get().sheet.map(|s| format!(" • sheet {}", s))}
                        {move || file.get().uploaded_label().map(|t| format!(" • uploaded {}", t))}
                    </div>
                </div>
                <button class="btn btn-secondary" on:click=on_remove>"Remove"</button>
            </div>

            <div class="section-title">"🔍 Preview (first " {PREVIEW_ROWS} " rows)"</div>
            <DataTable preview=Signal::derive(move || file.get().preview)/>

            <div class="section-title">"🛠️ Data Cleaning"</div>
            <label class="checkbox">
                <input
                    type="checkbox"
                    prop:checked=show_clean
                    on:change=move |ev| set_show_clean.set(event_target_checked(&ev))
                />
                "Clean Data for " {name}
            </label>
            <Show when=move || show_clean.get() fallback=|| view! { }>
                <div class="button-row">
                    <button class="btn" disabled=busy on:click=move |_| run_clean(true)>
                        "Remove Duplicates from " {name}
                    </button>
                    <button class="btn" disabled=busy on:click=move |_| run_clean(false)>
                        "Fill Missing Values for " {name}
                    </button>
                    <span class="hint">{move || format!("{} missing value(s)", file.get().missing_total())}</span>
                </div>
            </Show>

            <div class="section-title">"🎯 Select Columns to Keep"</div>
            <button
                class="btn btn-secondary"
                disabled=move || { let f = file.get(); f.selection.len() == f.columns.len() }
                on:click=move |_| send_selection(None)
            >
                "Select All"
            </button>
            <div class="column-picker">
                {move || {
                    let current = file.get();
                    current
                        .columns
                        .iter()
                        .map(|col| {
                            let column = col.name.clone();
                            let checked = current.selection.contains(&col.name);
                            view! {
                                <label class="checkbox" title=format!("{} • {} missing", col.kind, col.missing)>
                                    <input
                                        type="checkbox"
                                        prop:checked=checked
                                        on:change=move |ev| toggle_column(column.clone(), event_target_checked(&ev))
                                    />
                                    {col.name.clone()}
                                </label>
                            }
                        })
                        .collect_view()
                }}
            </div>

            <div class="section-title">"📊 Data Visualization"</div>
            <label class="checkbox">
                <input
                    type="checkbox"
                    prop:checked=show_chart
                    on:change=move |ev| set_show_chart.set(event_target_checked(&ev))
                />
                "Show Visualization for " {name}
            </label>
            <Show when=move || show_chart.get() fallback=|| view! { }>
                <select
                    class="chart-column"
                    on:change=move |ev| {
                        let value = event_target_value(&ev);
                        set_chart_column.set(if value.is_empty() { None } else { Some(value) });
                    }
                >
                    <option value="">"Default column"</option>
                    {move || {
                        file.get()
                            .numeric_selection()
                            .into_iter()
                            .map(|c| {
                                let selected = chart_column.get().as_deref() == Some(c.as_str());
                                view! { <option value=c.clone() selected=selected>{c}</option> }
                            })
                            .collect_view()
                    }}
                </select>
                <Suspense fallback=|| view! { <div class="hint">"Loading chart..."</div> }>
                    {move || match chart.get().flatten() {
                        Some(Ok(data)) => view! { <BarChartView chart=data/> }.into_view(),
                        Some(Err(e)) => view! { <div class="error-message">{e}</div> }.into_view(),
                        None => view! { }.into_view(),
                    }}
                </Suspense>
            </Show>

            <div class="section-title">"🔄 Conversion Options"</div>
            <div class="button-row">
                <span>"Convert " {name} " to:"</span>
                {format_radio(OutputFormat::Csv)}
                {format_radio(OutputFormat::Excel)}
                <button class="btn btn-primary" disabled=busy on:click=on_convert>
                    "Convert " {name}
                </button>
            </div>
        </div>
    }
}
