use merit::auth::AccessError;
use merit::cli::{internal_error, run, user_error};

fn main() {
    #[cfg(windows)]
    let _ = enable_ansi_support::enable_ansi_support();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    if let Err(e) = run() {
        // Permission failures are user errors
        if let Some(access) = e.downcast_ref::<AccessError>() {
            user_error(&access.to_string());
        }

        // Anything else reaching here is an internal failure
        let mut message = e.to_string();
        let causes: Vec<String> = e.chain().skip(1).map(|c| c.to_string()).collect();
        if !causes.is_empty() {
            message.push_str("\n\nCaused by:");
            for (depth, cause) in causes.iter().enumerate() {
                message.push_str(&format!("\n{:indent$}  {}", "", cause, indent = depth + 1));
            }
        }
        internal_error(&message);
    }
}
