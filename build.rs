use std::env;
use std::fs;
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-env-changed=NPCBOT_EMBED_ROSTER_PATH");

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set");
    let out_path = Path::new(&out_dir).join("npcbot_embedded_roster.json");

    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    let default_path = Path::new(&manifest_dir)
        .join("fixtures")
        .join("demo_roster.json");

    let path = match env::var("NPCBOT_EMBED_ROSTER_PATH") {
        Ok(path) => Path::new(&path).to_path_buf(),
        Err(_) => default_path,
    };
    println!("cargo:rerun-if-changed={}", path.display());
    let content = fs::read_to_string(&path).unwrap_or_else(|_| "{}".to_string());

    fs::write(out_path, content).expect("failed to write embedded roster");
}
