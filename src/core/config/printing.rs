use crate::core::config::data::Config;

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        println!("  server-address: {}", self.server_address());
        println!("  user-id: {}", self.user_id());
        println!(
            "  poll-interval-ms: {}",
            self.poll_interval().as_millis()
        );
        println!(
            "  request-timeout-secs: {}",
            self.request_timeout().as_secs()
        );
        match &self.viewer {
            Some(viewer) => println!("  viewer: {viewer}"),
            None => println!("  viewer: (unset, uses $PDF_VIEWER)"),
        }
    }
}
