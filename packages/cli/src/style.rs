use console::style;
use taskgen::{Notice, NoticeLevel};

pub fn print_success(msg: &str) {
    println!("  {} {}", style("✓").green(), msg);
}

pub fn print_info(msg: &str) {
    println!("  {} {}", style("→").cyan(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("  {} {}", style("✗").red(), msg);
}

pub fn print_header(title: &str) {
    println!();
    println!("  {}", style(title).bold());
    println!();
}

pub fn print_notices(notices: &[Notice]) {
    for notice in notices {
        match notice.level {
            NoticeLevel::Success => print_success(&notice.message),
            NoticeLevel::Info => print_info(&notice.message),
            NoticeLevel::Error => print_error(&notice.message),
        }
    }
}
