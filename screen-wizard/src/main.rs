use std::path::PathBuf;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // --config=<path> replaces the default settings.toml location.
    let config_path = args
        .iter()
        .find_map(|a| a.strip_prefix("--config="))
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from);

    if args.iter().any(|a| a == "--print-config") {
        screen_wizard::print_config(config_path.as_deref());
        return;
    }

    // Non-interactive TUI smoke test mode (for automated checks).
    // Renders a single frame for a specific step and exits 0.
    // Usage: --tui-smoke or --tui-smoke=info|cables|cabinets|modules|resolution
    if let Some(arg) = args
        .iter()
        .find(|a| a.as_str() == "--tui-smoke" || a.starts_with("--tui-smoke="))
    {
        let target = arg
            .split_once('=')
            .map(|(_, v)| v.to_string())
            .filter(|v| !v.trim().is_empty());
        screen_wizard::run_tui_smoke(config_path.as_deref(), target);
        return;
    }

    screen_wizard::run_tui(config_path.as_deref());
}
