use colorcore::{Locale, Profile};
use std::env;
use std::fs;

fn main() {
    let profile = if let Some(path) = env::args().nth(1) {
        let bytes = fs::read(path).expect("failed to read profile");
        Profile::unpack(&bytes).unwrap()
    } else {
        Profile::create_stock_srgb()
    };

    println!("description = {:?}", profile.description());

    match profile.query() {
        Ok(attrs) => println!("{attrs:#?}"),
        Err(e) => println!("query failed: {e}"),
    }

    if let Ok(fr) = profile.get_mlu("desc", Locale::new("fr_FR")) {
        println!("desc (fr_FR) = {fr:?}");
    }
}
