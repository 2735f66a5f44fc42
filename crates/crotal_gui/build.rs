use std::env;

fn main() {
    let version = env::var("CROTALPATH_VERSION")
        .unwrap_or_else(|_| env::var("CARGO_PKG_VERSION").unwrap());
    println!("cargo:rustc-env=CROTALPATH_VERSION={version}");
    println!("cargo:rerun-if-env-changed=CROTALPATH_VERSION");
}
