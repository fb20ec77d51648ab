// src/ui.rs

use crate::{constants, symbols};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::{
    io::{self, Write},
    time::Duration,
};

pub fn print_header(title: &str) {
    println!("\n{}", "═".repeat(constants::UI_WIDTH));
    println!(" {}", title.cyan().bold());
    println!("{}", "═".repeat(constants::UI_WIDTH));
}

pub fn print_sub_header(title: &str) {
    println!("\n--- {} ---", title.bold());
}

pub fn box_message(title: &str, content: &[&str], color_func: fn(ColoredString) -> ColoredString) {
    println!("\n┌{}┐", "─".repeat(constants::UI_WIDTH - 2));
    println!("  {}", color_func(title.bold()));
    println!("├{}┤", "─".repeat(constants::UI_WIDTH - 2));
    for line in content {
        println!("  {}", line);
    }
    println!("└{}┘", "─".repeat(constants::UI_WIDTH - 2));
}

pub fn plain(message: &str) {
    println!("{}", message);
}

pub fn info(message: &str) {
    println!("{} {}", *symbols::INFO, message);
}

pub fn success(message: &str) {
    println!("{} {}", *symbols::OK, message.green());
}

pub fn warn(message: &str) {
    eprintln!("{} {}", *symbols::WARN, message.yellow());
}

pub fn prompt(message: &str, default: Option<&str>) -> io::Result<String> {
    let default_str = default.map_or("".to_string(), |d| format!(" (default: {})", d));
    print!("\n>>> {}{}: ", message, default_str);
    io::stdout().flush()?;
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        // stdin 已关闭 (EOF)
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
    }
    let input = input.trim().to_string();
    if input.is_empty() {
        Ok(default.unwrap_or("").to_string())
    } else {
        Ok(input)
    }
}

pub fn confirm(question: &str, default_yes: bool) -> bool {
    let options = if default_yes { "(Y/n)" } else { "(y/N)" };
    loop {
        match prompt(&format!("{} {}", question, options), None) {
            Ok(choice) => {
                let choice = choice.to_lowercase();
                if choice == "y" || choice == "yes" {
                    return true;
                }
                if choice == "n" || choice == "no" {
                    return false;
                }
                if choice.is_empty() {
                    return default_yes;
                }
                println!("{}", "Please answer 'y' or 'n'.".red());
            }
            Err(_) => return false,
        }
    }
}

pub fn selection_menu(
    options: &[String],
    title: &str,
    instructions: &str,
    default_choice: &str,
) -> String {
    println!("\n┌{}┐", "─".repeat(constants::UI_WIDTH - 2));
    println!("  {}", title.cyan().bold());
    println!("├{}┤", "─".repeat(constants::UI_WIDTH - 2));

    let pad = options.len().to_string().len();
    for (i, option) in options.iter().enumerate() {
        println!(
            "  [{}] {}",
            format!("{:<pad$}", i + 1, pad = pad).yellow(),
            option
        );
    }

    println!("├{}┤", "─".repeat(constants::UI_WIDTH - 2));
    println!("  {} (press {} to quit)", instructions, *symbols::CTRL_C);
    println!("└{}┘", "─".repeat(constants::UI_WIDTH - 2));

    prompt("Your choice", Some(default_choice)).unwrap_or_default()
}

/// 从菜单中选出一项；输入无效时返回 None
pub fn choose_one<'a>(options: &'a [String], title: &str, default_index: usize) -> Option<&'a String> {
    let input = selection_menu(
        options,
        title,
        "Enter a number",
        &(default_index + 1).to_string(),
    );
    input
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|i| *i > 0 && *i <= options.len())
        .map(|i| &options[i - 1])
}

pub fn new_spinner(message: &str) -> ProgressBar {
    let pbar = ProgressBar::new_spinner();
    pbar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pbar.set_message(message.to_string());
    pbar.enable_steady_tick(Duration::from_millis(100));
    pbar
}

pub fn new_bytes_progress_bar(total: Option<u64>, prefix: &str) -> ProgressBar {
    let pbar = match total {
        Some(len) if len > 0 => {
            let pbar = ProgressBar::new(len);
            pbar.set_style(
                ProgressStyle::with_template(
                    "{prefix:7.bold.cyan} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, ETA: {eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
            );
            pbar
        }
        _ => {
            let pbar = ProgressBar::new_spinner();
            pbar.set_style(
                ProgressStyle::with_template("{prefix:7.bold.cyan} {spinner} {bytes} ({bytes_per_sec})")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pbar
        }
    };
    pbar.set_prefix(prefix.to_string());
    pbar.enable_steady_tick(Duration::from_millis(100));
    pbar
}
