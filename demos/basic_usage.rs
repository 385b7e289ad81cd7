use oops::{Blame, Namespace, Reason, Result, ResultExt, define_errors, emit, wrap};

define_errors! {
    CONFIG_MISSING = oops::Definition::classified(Blame::DEVELOPER, Namespace::SETUP, Reason::CONFIG_MISSING)
        .with_help("set the listed configuration key");
    CONFIG_READ = oops::Definition::classified(Blame::SERVER, Namespace::SETUP, Reason::IO).with_trace();
}

fn read_file(path: &str) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| wrap!(CONFIG_READ, e, "path={}", path))
}

fn load_configuration(key: &str) -> Result<String> {
    if key.is_empty() {
        return Err(emit!(CONFIG_MISSING, "no key given"));
    }
    read_file("/etc/demo/missing.toml").explain("loading configuration")
}

fn main() {
    println!("--- Basic Usage Example ---\n");

    match load_configuration("database.url") {
        Ok(_) => println!("Success!"),
        Err(err) => {
            // SCENARIO 1: The client sees the rendered code and explanation,
            // or the JSON body.
            println!("1. [CLIENT RESPONSE]");
            println!("   status: {:?}", err.status_code());
            println!("   text:   {}", err);
            println!("   json:   {}", err.to_json().unwrap_or_default());

            // SCENARIO 2: Operators see causes and the captured trace.
            println!("\n2. [DIAGNOSTIC LOG]");
            err.with_diagnostic_log(|log| {
                let mut line = String::new();
                let _ = log.write_to(&mut line);
                println!("   {}", line);
                for frame in log.trace().iter().take(3) {
                    println!("   at {}", frame);
                }
            });

            // SCENARIO 3: Code branches on the classification, not the text.
            println!("\n3. [MATCHING]");
            println!("   read failure:  {}", err.is(&CONFIG_READ));
            println!("   missing key:   {}", err.is(&CONFIG_MISSING));
            println!(
                "   io kind:       {:?}",
                err.find_cause::<std::io::Error>().map(|e| e.kind())
            );
        }
    }

    if let Err(err) = load_configuration("") {
        println!("\n4. [HELP TEXT]");
        println!("   {} -> {}", err, err.help());
    }
}
