//! Instance-based learning of a binary risky choice.
//!
//! On every trial the agent picks one of two doors by blending the
//! payoffs it remembers behind each: "safe" always pays 1, "risky" pays
//! 12 one time in nine and otherwise nothing. Early on the agent samples
//! both; as experience accumulates, blending settles toward whichever
//! door has actually paid off for it, underweighting the rare big win
//! the way human participants do.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use recollect_core::{slots, Advance, Memory, Result};

const TRIALS: usize = 60;
const PARTICIPANTS: usize = 200;
const RISKY_PAYOFF: i64 = 12;
const RISKY_ODDS: f64 = 1.0 / 9.0;

fn payoff(rng: &mut StdRng, door: &str) -> i64 {
	if door == "safe" {
		1
	} else if rng.gen::<f64>() < RISKY_ODDS {
		RISKY_PAYOFF
	} else {
		0
	}
}

fn run_participant(seed: u64) -> Result<Vec<bool>> {
	let mut rng = StdRng::seed_from_u64(seed);
	let mut memory = Memory::with_seed(seed);

	// prior experience: one imagined win behind each door
	memory.learn(slots! { "door" => "safe", "payoff" => 1 })?;
	memory.learn_and_advance(slots! { "door" => "risky", "payoff" => RISKY_PAYOFF }, Advance::Unit)?;

	let candidates = vec![slots! { "door" => "safe" }, slots! { "door" => "risky" }];
	let mut risky_choices = Vec::with_capacity(TRIALS);
	for _ in 0..TRIALS {
		let choice = match memory.best_blend("payoff", &candidates, false)? {
			Some((1, _)) => "risky",
			_ => "safe",
		};
		risky_choices.push(choice == "risky");
		let earned = payoff(&mut rng, choice);
		memory.learn_and_advance(slots! { "door" => choice, "payoff" => earned }, Advance::Unit)?;
	}
	Ok(risky_choices)
}

fn main() -> Result<()> {
	let mut risky_by_trial = vec![0usize; TRIALS];
	for participant in 0..PARTICIPANTS {
		let choices = run_participant(participant as u64)?;
		for (trial, went_risky) in choices.into_iter().enumerate() {
			if went_risky {
				risky_by_trial[trial] += 1;
			}
		}
	}

	println!("trial  P(risky)");
	for (trial, count) in risky_by_trial.iter().enumerate().step_by(5) {
		#[allow(clippy::cast_precision_loss)]
		let fraction = *count as f64 / PARTICIPANTS as f64;
		println!("{trial:>5}  {fraction:.3}");
	}
	Ok(())
}
