//! Print the key generation message

use colored::Colorize;

pub fn run() {
    println!();
    println!("{}", "Sign this message with your wallet (personal_sign):".cyan());
    println!();
    println!("{}", safe_stealth::signing_message());
    println!();
    println!(
        "{}",
        "Then pass the 65-byte signature to 'safestealth keygen --signature <hex>'.".dimmed()
    );
}
