use serde_json::Value;

const DEFAULT_PROCESSED_NAME: &str = "resultado_analisis.json";
const DEFAULT_GRAPH_NAME: &str = "grafo";

/// Name of the JSON download produced when processing completes.
///
/// Falls back to a fixed name and always ends in `.json`.
pub fn processed_download_name(archivo_procesado: Option<&str>) -> String {
    match archivo_procesado.map(str::trim) {
        Some(name) if !name.is_empty() => {
            if name.ends_with(".json") {
                name.to_string()
            } else {
                format!("{name}.json")
            }
        }
        _ => DEFAULT_PROCESSED_NAME.to_string(),
    }
}

/// The `nombre_grafo` field of a graph document, if it is a non-empty string.
pub fn graph_name(graph: &Value) -> Option<&str> {
    graph
        .get("nombre_grafo")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

/// `<nombre_grafo>.<extension>` for artifacts derived from a graph document.
pub fn graph_artifact_name(graph: Option<&Value>, extension: &str) -> String {
    let stem = graph.and_then(graph_name).unwrap_or(DEFAULT_GRAPH_NAME);
    format!("{stem}.{extension}")
}

/// File name with its final extension removed.
pub fn root_name(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => file_name.to_string(),
    }
}
