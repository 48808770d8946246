use dioxus_logger::tracing::Level;

fn main() {
    // Initialize logging for WASM
    wasm_logger::init(wasm_logger::Config::default());
    dioxus_logger::init(Level::INFO).ok();

    match graph_ui::boot() {
        Ok(controller) => {
            dioxus_logger::tracing::info!("Graph view attached");
            controller.keep_alive();
        }
        Err(e) => {
            dioxus_logger::tracing::error!("Failed to attach graph view: {}", e);
        }
    }
}
