use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use blemish_removal::{default_output_path, HealConfig, HealSession};

#[derive(Parser)]
#[command(
    name = "blemish-remover",
    about = "Point-and-click blemish removal: clone the smoothest nearby patch over each click",
    version,
    after_help = "Interactive mode (default): left-click heals a spot, R resets, S saves, Esc quits.\n\
                  Headless mode: pass one or more --click x,y to heal without a window and save."
)]
struct Cli {
    /// Input image file
    input: String,

    /// Output file (default: {name}_healed.{ext})
    #[arg(short, long)]
    output: Option<String>,

    /// Clone patch side length in pixels
    #[arg(long, default_value = "40")]
    patch_size: u32,

    /// Heal at the given x,y coordinate without opening a window (repeatable)
    #[arg(long, value_name = "X,Y", value_parser = parse_click)]
    click: Vec<(u32, u32)>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn parse_click(s: &str) -> Result<(u32, u32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got '{s}'"))?;
    let x = x.trim().parse().map_err(|e| format!("bad x '{x}': {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad y '{y}': {e}"))?;
    Ok((x, y))
}

fn main() {
    let cli = Cli::parse();

    if cli.patch_size == 0 {
        eprintln!("Error: Patch size must be positive");
        process::exit(1);
    }

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    let config = HealConfig {
        patch_size: cli.patch_size,
    };
    let mut session = match HealSession::from_path(input_path, config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Fatal: Failed to load {}: {e}", cli.input);
            process::exit(1);
        }
    };

    let output_path = cli
        .output
        .as_ref()
        .map_or_else(|| default_output_path(input_path), PathBuf::from);

    if cli.click.is_empty() {
        run_window(&mut session, &cli, &output_path);
    } else {
        run_headless(&mut session, &cli, &output_path);
    }
}

/// Apply the requested clicks in order and save the result.
fn run_headless(session: &mut HealSession, cli: &Cli, output_path: &Path) {
    let mut failed = 0u32;
    for &(x, y) in &cli.click {
        match session.heal(x, y) {
            Ok(()) => {
                if !cli.quiet {
                    eprintln!("[OK] healed ({x},{y})");
                }
            }
            Err(e) => {
                eprintln!("[FAIL] ({x},{y}): {e}");
                failed += 1;
            }
        }
    }

    if let Err(e) = blemish_removal::save_image(session.working(), output_path) {
        eprintln!("[FAIL] saving {}: {e}", output_path.display());
        process::exit(1);
    }
    if !cli.quiet {
        eprintln!("[OK] saved {}", output_path.display());
    }
    if failed > 0 {
        process::exit(1);
    }
}

/// Interactive loop: a window shows the working image; left-click heals,
/// `R` resets, `S` saves, `Esc` or closing the window quits.
fn run_window(session: &mut HealSession, cli: &Cli, output_path: &Path) {
    let (width, height) = session.working().dimensions();
    let (w, h) = (width as usize, height as usize);

    let mut window = match Window::new("Blemish Remover", w, h, WindowOptions::default()) {
        Ok(win) => win,
        Err(e) => {
            eprintln!("Fatal: Failed to open window: {e}");
            process::exit(1);
        }
    };

    if !cli.quiet {
        eprintln!("Left-click: heal  |  R: reset  |  S: save  |  Esc: quit");
    }

    let mut framebuffer = to_argb(session.working());
    let mut mouse_was_down = false;

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let mouse_down = window.get_mouse_down(MouseButton::Left);
        if mouse_down && !mouse_was_down {
            if let Some((mx, my)) = window.get_mouse_pos(MouseMode::Discard) {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let (x, y) = (mx.max(0.0) as u32, my.max(0.0) as u32);
                match session.heal(x, y) {
                    Ok(()) => {
                        framebuffer = to_argb(session.working());
                        if cli.verbose {
                            eprintln!("[OK] healed ({x},{y})");
                        }
                    }
                    Err(e) => eprintln!("[FAIL] ({x},{y}): {e}"),
                }
            }
        }
        mouse_was_down = mouse_down;

        if window.is_key_pressed(Key::R, KeyRepeat::No) {
            session.reset();
            framebuffer = to_argb(session.working());
            if !cli.quiet {
                eprintln!("[OK] reset to original");
            }
        }

        if window.is_key_pressed(Key::S, KeyRepeat::No) {
            match blemish_removal::save_image(session.working(), output_path) {
                Ok(()) => {
                    if !cli.quiet {
                        eprintln!("[OK] saved {}", output_path.display());
                    }
                }
                Err(e) => eprintln!("[FAIL] saving {}: {e}", output_path.display()),
            }
        }

        if let Err(e) = window.update_with_buffer(&framebuffer, w, h) {
            eprintln!("Fatal: Window update failed: {e}");
            process::exit(1);
        }
    }
}

/// Pack an RGB image into the 0RGB u32 buffer minifb expects.
fn to_argb(img: &image::RgbImage) -> Vec<u32> {
    img.pixels()
        .map(|px| (u32::from(px[0]) << 16) | (u32::from(px[1]) << 8) | u32::from(px[2]))
        .collect()
}
