//! Native printing commands for Tauri docsign app.
//!
//! This module provides platform-specific printing functionality for PDFs.
//! On macOS, it uses the `lpr` command and system printing infrastructure.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

/// Characters that are dangerous in printer names (command injection risk)
pub const DANGEROUS_PRINTER_CHARS: [char; 10] =
    ['\'', '"', ';', '&', '|', '`', '$', '\\', '\n', '\r'];

/// Information about an available printer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrinterInfo {
    /// The printer name (as known to the system)
    pub name: String,
    /// Whether this is the default printer
    pub is_default: bool,
}

/// Validates a printer name for security.
///
/// Returns `Ok(())` if the printer name is safe to use in a command,
/// or an error if it contains dangerous characters that could enable
/// command injection attacks.
pub fn validate_printer_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Printer name cannot be empty".to_string());
    }

    if name.contains(DANGEROUS_PRINTER_CHARS) {
        return Err("Invalid printer name".to_string());
    }

    // Also reject names that are suspiciously long
    if name.len() > 256 {
        return Err("Printer name is too long".to_string());
    }

    Ok(())
}

/// Checks if a character is dangerous for printer names.
pub fn is_dangerous_printer_char(c: char) -> bool {
    DANGEROUS_PRINTER_CHARS.contains(&c)
}

/// Sanitizes a printer name by removing dangerous characters.
///
/// Note: This is provided for reference, but we prefer to reject
/// rather than sanitize to maintain security guarantees.
pub fn sanitize_printer_name(name: &str) -> String {
    name.chars()
        .filter(|c| !is_dangerous_printer_char(*c))
        .collect()
}

/// Formats an error message for print failures.
pub fn format_print_error(context: &str, error: impl std::fmt::Display) -> String {
    format!("{}: {}", context, error)
}

/// Formats an error message for printer not found.
pub fn format_printer_not_found(printer_name: &str) -> String {
    format!("Printer '{}' not found", printer_name)
}

/// Formats a generic print failure message.
pub fn format_print_failure_generic() -> String {
    "Failed to print - please check your printer connection".to_string()
}

/// Formats an error message for command execution failure.
pub fn format_command_error(error: impl std::fmt::Display) -> String {
    format!("Failed to execute print command: {}", error)
}

/// Parses lpstat output to extract printer information.
///
/// Expected format: "printer PrinterName is idle..." or "printer PrinterName disabled..."
pub fn parse_lpstat_printer_line(line: &str, default_printer: Option<&str>) -> Option<PrinterInfo> {
    if line.starts_with("printer ") {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() >= 2 {
            let name = parts[1].to_string();
            let is_default = default_printer == Some(&name);
            return Some(PrinterInfo { name, is_default });
        }
    }
    None
}

/// Parses the default printer from lpstat -d output.
///
/// Expected format: "system default destination: PrinterName"
pub fn parse_default_printer(output: &str) -> Option<String> {
    output
        .trim()
        .split(':')
        .last()
        .map(|s| s.trim().to_string())
}

/// Opens the system print dialog with the provided PDF.
///
/// This creates a temporary file with the PDF contents and opens it
/// with the system's default PDF viewer, which typically provides
/// a print option.
#[tauri::command]
pub async fn print_pdf(pdf_bytes: Vec<u8>) -> Result<bool, String> {
    // Create a temporary file with .pdf extension
    let temp_file = create_temp_pdf(&pdf_bytes)?;
    let temp_path = temp_file.path();

    #[cfg(target_os = "macos")]
    {
        // On macOS, use the `open` command with the print flag
        // This opens Preview with the print dialog
        let result = Command::new("open")
            .arg("-a")
            .arg("Preview")
            .arg(temp_path)
            .spawn();

        match result {
            Ok(mut child) => {
                // Wait a bit for Preview to open, then send print command via AppleScript
                std::thread::sleep(std::time::Duration::from_millis(1000));

                let print_script = format!(
                    r#"tell application "Preview"
                        activate
                        tell application "System Events"
                            keystroke "p" using command down
                        end tell
                    end tell"#
                );

                let _ = Command::new("osascript")
                    .arg("-e")
                    .arg(&print_script)
                    .output();

                // Keep the temp file alive for a while so Preview can use it
                // In a real implementation, we'd track when the file is no longer needed
                let temp_path_owned = temp_path.to_path_buf();
                std::thread::spawn(move || {
                    std::thread::sleep(std::time::Duration::from_secs(60));
                    let _ = std::fs::remove_file(temp_path_owned);
                });

                // Forget about the temp file so it's not deleted immediately
                std::mem::forget(temp_file);

                let _ = child.wait();
                Ok(true)
            }
            Err(e) => Err(format!("Failed to open print dialog: {}", e)),
        }
    }

    #[cfg(target_os = "windows")]
    {
        // On Windows, use ShellExecute with "print" verb
        let result = Command::new("cmd")
            .args(["/C", "start", "/wait", "print"])
            .arg(temp_path)
            .spawn();

        match result {
            Ok(mut child) => {
                let _ = child.wait();
                Ok(true)
            }
            Err(e) => Err(format!("Failed to print: {}", e)),
        }
    }

    #[cfg(target_os = "linux")]
    {
        // On Linux, use lpr or xdg-open
        let result = Command::new("lpr").arg(temp_path).spawn();

        match result {
            Ok(mut child) => {
                let _ = child.wait();
                Ok(true)
            }
            Err(_) => {
                // Fallback to xdg-open
                let result = Command::new("xdg-open").arg(temp_path).spawn();

                match result {
                    Ok(mut child) => {
                        let _ = child.wait();
                        Ok(true)
                    }
                    Err(e) => Err(format!("Failed to print: {}", e)),
                }
            }
        }
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        Err("Printing not supported on this platform".to_string())
    }
}

/// Lists all available printers on the system.
#[tauri::command]
pub async fn get_available_printers() -> Result<Vec<PrinterInfo>, String> {
    #[cfg(target_os = "macos")]
    {
        get_macos_printers()
    }

    #[cfg(target_os = "windows")]
    {
        get_windows_printers()
    }

    #[cfg(target_os = "linux")]
    {
        get_linux_printers()
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        Err("Printer listing not supported on this platform".to_string())
    }
}

/// Prints a PDF directly to a specified printer.
#[tauri::command]
pub async fn print_to_printer(pdf_bytes: Vec<u8>, printer_name: String) -> Result<bool, String> {
    // Validate printer name to prevent command injection
    validate_printer_name(&printer_name)?;

    let temp_file = create_temp_pdf(&pdf_bytes)?;
    let temp_path = temp_file.path();

    #[cfg(target_os = "macos")]
    {
        // Use lpr with printer name
        let result = Command::new("lpr")
            .arg("-P")
            .arg(&printer_name)
            .arg(temp_path)
            .output();

        match result {
            Ok(output) => {
                if output.status.success() {
                    Ok(true)
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    if stderr.contains("Unknown printer") || stderr.contains("not exist") {
                        Err(format!("Printer '{}' not found", printer_name))
                    } else if stderr.is_empty() {
                        Err("Failed to print - please check your printer connection".to_string())
                    } else {
                        Err(format!("Print failed: {}", stderr.trim()))
                    }
                }
            }
            Err(e) => Err(format!("Failed to execute print command: {}", e)),
        }
    }

    #[cfg(target_os = "windows")]
    {
        // On Windows, use print command with printer selection
        let result = Command::new("print")
            .arg(format!("/D:{}", printer_name))
            .arg(temp_path)
            .output();

        match result {
            Ok(output) => {
                if output.status.success() {
                    Ok(true)
                } else {
                    Err("Failed to print - please check your printer connection".to_string())
                }
            }
            Err(e) => Err(format!("Failed to execute print command: {}", e)),
        }
    }

    #[cfg(target_os = "linux")]
    {
        // Use lpr with printer name
        let result = Command::new("lpr")
            .arg("-P")
            .arg(&printer_name)
            .arg(temp_path)
            .output();

        match result {
            Ok(output) => {
                if output.status.success() {
                    Ok(true)
                } else {
                    Err("Failed to print - please check your printer connection".to_string())
                }
            }
            Err(e) => Err(format!("Failed to execute print command: {}", e)),
        }
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        Err("Direct printing not supported on this platform".to_string())
    }
}

/// Creates a temporary PDF file from the given bytes.
fn create_temp_pdf(pdf_bytes: &[u8]) -> Result<NamedTempFile, String> {
    let mut temp_file = tempfile::Builder::new()
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| format!("Failed to create temporary file: {}", e))?;

    temp_file
        .write_all(pdf_bytes)
        .map_err(|e| format!("Failed to write PDF data: {}", e))?;

    temp_file
        .flush()
        .map_err(|e| format!("Failed to flush PDF data: {}", e))?;

    Ok(temp_file)
}

#[cfg(target_os = "macos")]
fn get_macos_printers() -> Result<Vec<PrinterInfo>, String> {
    // Get default printer
    let default_printer = Command::new("lpstat")
        .arg("-d")
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                let stdout = String::from_utf8_lossy(&output.stdout);
                // Output format: "system default destination: PrinterName"
                stdout
                    .trim()
                    .split(':')
                    .last()
                    .map(|s| s.trim().to_string())
            } else {
                None
            }
        });

    // Get all printers
    let output = Command::new("lpstat")
        .arg("-p")
        .output()
        .map_err(|e| format!("Failed to list printers: {}", e))?;

    if !output.status.success() {
        // No printers configured
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("No destinations") || stderr.contains("lpstat: No") {
            return Ok(vec![]);
        }
        return Err("No printers available".to_string());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let printers: Vec<PrinterInfo> = stdout
        .lines()
        .filter_map(|line| {
            // Output format: "printer PrinterName is idle..."
            // or "printer PrinterName disabled..."
            if line.starts_with("printer ") {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() >= 2 {
                    let name = parts[1].to_string();
                    let is_default = default_printer.as_ref() == Some(&name);
                    return Some(PrinterInfo { name, is_default });
                }
            }
            None
        })
        .collect();

    if printers.is_empty() {
        Ok(vec![])
    } else {
        Ok(printers)
    }
}

#[cfg(target_os = "windows")]
fn get_windows_printers() -> Result<Vec<PrinterInfo>, String> {
    // Use wmic to list printers
    let output = Command::new("wmic")
        .args(["printer", "get", "name,default"])
        .output()
        .map_err(|e| format!("Failed to list printers: {}", e))?;

    if !output.status.success() {
        return Err("No printers available".to_string());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let printers: Vec<PrinterInfo> = stdout
        .lines()
        .skip(1) // Skip header
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 2 {
                let is_default = parts[0].to_lowercase() == "true";
                let name = parts[1..].join(" ");
                if !name.is_empty() {
                    return Some(PrinterInfo { name, is_default });
                }
            }
            None
        })
        .collect();

    if printers.is_empty() {
        Ok(vec![])
    } else {
        Ok(printers)
    }
}

#[cfg(target_os = "linux")]
fn get_linux_printers() -> Result<Vec<PrinterInfo>, String> {
    // Same as macOS - uses CUPS
    get_macos_printers()
}
