//! Guess the number
//!
//! The player has six tries to find a number between 1 and 50.

use std::fmt::{self, Display};
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::ops::RangeInclusive;

use log::debug;
use rand::Rng;

/// Range the secret number is drawn from
pub const SECRET_RANGE: RangeInclusive<u32> = 1..=50;
/// Guesses allowed per game
pub const MAX_GUESSES: u32 = 6;

/// Error type for a game session
#[derive(Debug)]
pub enum GameError {
    /// Input ended before the game finished
    InputClosed,
    /// Reading input or writing output failed
    Io(io::Error),
}

impl Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::InputClosed => write!(f, "Input closed before the game finished"),
            GameError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl Error for GameError {}

impl From<io::Error> for GameError {
    fn from(e: io::Error) -> Self {
        GameError::Io(e)
    }
}

/// How a game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Found the number using this many guesses
    Won { guesses: u32 },
    /// Ran out of guesses
    Lost { secret: u32 },
}

/// One round of the game
#[derive(Debug, Clone)]
pub struct GuessGame {
    name: String,
    secret: u32,
}

/// Read one line, stripping the line ending. `None` at end of input.
fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>, GameError> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

impl GuessGame {
    pub fn new(name: impl Into<String>, secret: u32) -> Self {
        Self { name: name.into(), secret }
    }

    /// Draw the secret uniformly from `SECRET_RANGE`
    pub fn random<G: Rng + ?Sized>(name: impl Into<String>, rng: &mut G) -> Self {
        Self::new(name, rng.gen_range(SECRET_RANGE))
    }

    pub fn secret(&self) -> u32 {
        self.secret
    }

    /// Play until the number is found or the guesses run out.
    ///
    /// Lines that are not integers are rejected without using up a guess.
    pub fn play<R: BufRead, W: Write>(&self, input: &mut R, output: &mut W) -> Result<Outcome, GameError> {
        writeln!(output, "Well, {}... I am thinking of a number between {} and {}.",
            self.name, SECRET_RANGE.start(), SECRET_RANGE.end())?;

        let mut guesses_taken = 0;
        let mut found = false;
        while guesses_taken < MAX_GUESSES {
            writeln!(output, "Take a guess...")?;
            output.flush()?;

            let line = read_line(input)?.ok_or(GameError::InputClosed)?;
            let guess: i64 = match line.trim().parse() {
                Ok(guess) => guess,
                Err(_) => {
                    writeln!(output, "That is not a number.")?;
                    continue;
                }
            };
            guesses_taken += 1;
            debug!("Guess {} of {}: {}", guesses_taken, MAX_GUESSES, guess);

            let secret = i64::from(self.secret);
            if guess < secret {
                writeln!(output, "Your guess is too low!")?;
            } else if guess > secret {
                writeln!(output, "Your guess is too high!")?;
            } else {
                found = true;
                break;
            }
        }

        let outcome = if found {
            writeln!(output, "Great, {}!  You got the correct answer in  {} guesses!", self.name, guesses_taken)?;
            Outcome::Won { guesses: guesses_taken }
        } else {
            writeln!(output, "Nope, the number I was thinking of was {}.", self.secret)?;
            Outcome::Lost { secret: self.secret }
        };
        output.flush()?;
        Ok(outcome)
    }
}

/// Ask for the player's name, then play one game with a random secret
pub fn run_interactive<R: BufRead, W: Write, G: Rng + ?Sized>(
    input: &mut R,
    output: &mut W,
    rng: &mut G,
) -> Result<Outcome, GameError> {
    writeln!(output, "Greetings! What is your name?")?;
    output.flush()?;
    let name = read_line(input)?.ok_or(GameError::InputClosed)?;

    let game = GuessGame::random(name, rng);
    game.play(input, output)
}
