/// Example program to print the loaded configuration
///
/// Run with: cargo run -p dreamweb-config --example print_config

fn main() {
    let config = dreamweb_config::DreamwebConfig::load();

    println!("=== DreamWeb Configuration ===\n");

    println!("Runtime:");
    println!("  Root id: {}", config.runtime.root_id);
    println!("  Page URL: {:?}", config.runtime.page_url);
    println!();

    println!("Dev channel:");
    println!("  Live reload: {}", config.dev.live_reload);
    println!("  Reconnect delay: {}ms", config.dev.reconnect_delay_ms);
    println!();

    println!("HTTP:");
    println!("  Timeout: {:?}", config.http.timeout_ms);
    println!("  User agent: {}", config.http.user_agent);
    println!();

    println!("Toast:");
    println!("  Position: {}", config.toast.position);
    println!("  Duration: {}ms", config.toast.duration_ms);
    println!();

    match toml::to_string_pretty(&config) {
        Ok(toml_str) => {
            println!("=== Serialized Configuration ===");
            println!("{}", toml_str);
        }
        Err(e) => {
            eprintln!("Failed to serialize config: {}", e);
        }
    }
}
