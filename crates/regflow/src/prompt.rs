//! Interactive confirmation of cost-incurring actions
//!
//! A registration needs two answers: the literal word `REGISTER`, then
//! `yes`. Anything else, including end of input, declines.

use regflow_core::{Action, ActionPayload, Confirm};
use std::io::{self, BufRead, Write};

/// Asks on the terminal; prompts go to stderr so stdout carries only the report
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, action: &Action) -> bool {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stderr();
        confirm_with(action, &mut input, &mut output).unwrap_or(false)
    }
}

/// Run the two-step confirmation over arbitrary streams
pub fn confirm_with(
    action: &Action,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> io::Result<bool> {
    writeln!(output)?;
    writeln!(output, "⚠️  About to {} ({} action)", action, action.risk_class())?;
    if let ActionPayload::Registration { quote: Some(quote) } = action.payload() {
        let currency = quote.currency.as_deref().unwrap_or("");
        if let Some(price) = quote.price {
            writeln!(output, "   Price:   {:.2} {}", price, currency)?;
        }
        if let Some(balance) = quote.balance {
            writeln!(output, "   Balance: {:.2} {}", balance, currency)?;
        }
        if quote.premium {
            writeln!(output, "   This is a premium domain.")?;
        }
    }

    write!(output, "Type REGISTER to continue: ")?;
    output.flush()?;
    if read_answer(input)? != "REGISTER" {
        writeln!(output, "Not confirmed.")?;
        return Ok(false);
    }

    write!(output, "Are you sure? This will charge your account (yes/no): ")?;
    output.flush()?;
    let confirmed = read_answer(input)?.eq_ignore_ascii_case("yes");
    if !confirmed {
        writeln!(output, "Not confirmed.")?;
    }
    Ok(confirmed)
}

fn read_answer(input: &mut impl BufRead) -> io::Result<String> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}
