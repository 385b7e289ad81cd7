use oops::{Blame, Definition, Namespace, Reason, Registry, presets};
use std::io;

fn fetch_rates(registry: &Registry) -> oops::Result<f64> {
    let timeout = registry
        .get("THIRD_PARTY.INTEGRATION.TIMEOUT")
        .cloned()
        .unwrap_or_else(|| presets::UNEXPECTED.clone());

    let cause = io::Error::new(io::ErrorKind::TimedOut, "rates.example.net:443 timed out after 3s");
    let mut err = timeout.wrap(cause, "fetching EUR rates");
    err.set_property("attempt", 3)
        .set_property("upstream", "rates")
        .set_path("quotes[{}]", &[&"EUR"]);
    Err(err)
}

fn main() {
    println!("--- Diagnostic Logging Example ---\n");

    let timeout =
        Definition::classified(Blame::THIRD_PARTY, Namespace::INTEGRATION, Reason::TIMEOUT).with_trace();

    let registry = match Registry::builder()
        .with_presets()
        .and_then(|builder| builder.register(&timeout))
    {
        Ok(builder) => builder.build(),
        Err(err) => {
            eprintln!("registry setup failed: {}", err);
            return;
        }
    };

    println!("registered codes:");
    for definition in &registry {
        println!("  {:<40} status={:?}", definition.code(), definition.status_code());
    }

    let Err(err) = fetch_rates(&registry) else {
        return;
    };

    // What a client receives
    println!("\nclient: {}", err.to_json().unwrap_or_default());

    // What an operator's log line contains
    let mut line = String::new();
    let _ = err.diagnostic_log().write_to(&mut line);
    println!("log:    {}", line);

    // Structured access for a JSON log sink
    err.with_diagnostic_log(|log| {
        for (key, value) in log.properties() {
            println!("  property {} = {}", key, value);
        }
        for (depth, cause) in log.causes().enumerate() {
            println!("  cause[{}] {}", depth, cause);
        }
        println!("  frames captured: {}", log.trace().len());
    });

    #[cfg(all(feature = "trusted_debug", debug_assertions))]
    println!("\n{}", err.diagnostic_log().format_for_trusted_debug());
}
