//! Table formatting helpers for CLI output.

use comfy_table::{ContentArrangement, Table};

use a3s_build_core::{AdditionalBuildContext, BuildOutput, Sink};

use crate::build::ResolvedBuild;

/// Create a styled table with the given headers.
pub fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.load_preset(comfy_table::presets::NOTHING);
    table.set_header(headers);
    table
}

/// Format a byte count as a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn or_none<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "<none>".to_string())
}

fn join_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "<none>".to_string()
    } else {
        values.join(", ")
    }
}

fn sink(sink: &Sink) -> String {
    sink.to_string()
}

/// Render a resolved build as a two-column table.
pub fn build_table(resolved: &ResolvedBuild) -> Table {
    let o = &resolved.options;
    let mut table = new_table(&["SETTING", "VALUE"]);

    let mut args: Vec<String> = o.args.iter().map(|(k, v)| format!("{k}={v}")).collect();
    args.sort();
    let mut contexts: Vec<String> = o
        .additional_build_contexts
        .iter()
        .map(|(name, ctx)| match ctx {
            AdditionalBuildContext::Local(path) => format!("{name}={}", path.display()),
            AdditionalBuildContext::Url(url) => format!("{name}={url}"),
            AdditionalBuildContext::Image(image) => format!("{name}=image:{image}"),
        })
        .collect();
    contexts.sort();

    let platforms: Vec<String> = o.platforms.iter().map(|p| p.to_string()).collect();
    let namespaces: Vec<String> = o
        .namespace_options
        .iter()
        .map(|ns| match (&ns.path, ns.host) {
            (Some(path), _) => format!("{}={}", ns.name, path.display()),
            (None, true) => format!("{}=host", ns.name),
            (None, false) => format!("{}=private", ns.name),
        })
        .collect();
    let build_output = o.build_output.as_ref().map(|out| match out {
        BuildOutput::Local(path) => format!("local:{}", path.display()),
        BuildOutput::Tar(path) => format!("tar:{}", path.display()),
        BuildOutput::Stdout => "tar:stdout".to_string(),
    });

    let rows: Vec<(&str, String)> = vec![
        ("Context", o.context_directory.display().to_string()),
        ("Containerfiles", resolved.containerfiles.join(", ")),
        ("Output", or_none(o.output.as_deref())),
        ("Additional tags", join_or_none(&o.additional_tags)),
        ("Manifest", or_none(o.manifest.as_deref())),
        ("Pull policy", o.pull_policy.to_string()),
        ("Format", format!("{} ({})", o.output_format, o.output_format.manifest_type())),
        ("Isolation", o.isolation.to_string()),
        ("Runtime", format!("{} {}", o.runtime, o.runtime_args.join(" ")).trim_end().to_string()),
        ("Layers", o.layers.to_string()),
        ("No cache", o.no_cache.to_string()),
        ("Remove intermediates", o.remove_intermediate_ctrs.to_string()),
        ("Force remove", o.force_rm_intermediate_ctrs.to_string()),
        ("Compression", format!("{:?}", o.compression).to_lowercase()),
        ("Build args", join_or_none(&args)),
        ("Build contexts", join_or_none(&contexts)),
        ("Platforms", join_or_none(&platforms)),
        ("Namespaces", join_or_none(&namespaces)),
        ("Network", format!("{:?}", o.configure_network).to_lowercase()),
        ("Memory", or_none(o.common_build_opts.memory.map(|m| format_bytes(m.max(0) as u64)))),
        ("Excludes", o.excludes.len().to_string()),
        ("Build output", or_none(build_output)),
        ("Stdout", sink(&o.streams.out)),
        ("Stderr", sink(&o.streams.err)),
        ("Report", sink(&o.streams.report)),
        ("Timestamp", or_none(o.timestamp.map(|t| t.to_rfc3339()))),
        (
            "Retries",
            format!("{} (delay {:?})", o.max_pull_push_retries, o.pull_push_retry_delay),
        ),
        ("Jobs", o.jobs.to_string()),
        ("Encrypted layers", or_none(o.oci_encrypt_layers.as_ref().map(|l| format!("{l:?}")))),
        (
            "Decryption keys",
            if o.oci_decrypt_config.is_empty() { "no" } else { "yes" }.to_string(),
        ),
    ];

    for (name, value) in rows {
        table.add_row(vec![name.to_string(), value]);
    }
    table
}
