//! Two memory-based agents playing iterated rock-paper-scissors.
//!
//! Each agent remembers what its opponent threw following the previous
//! throw (one agent conditions on one move of lag, the other on two) and
//! predicts the next throw with a discrete blend over those memories,
//! then plays the counter to the prediction. The deeper-lag agent ends
//! up exploiting the shallower one's predictability.

use recollect_core::{slots, Advance, Memory, Result, Slots, Value};

const ROUNDS: usize = 300;
const MOVES: [&str; 3] = ["rock", "paper", "scissors"];

fn beats(candidate: &str) -> &'static str {
	match candidate {
		"rock" => "paper",
		"paper" => "scissors",
		_ => "rock",
	}
}

fn score(us: &str, them: &str) -> i32 {
	if us == them {
		0
	} else if beats(them) == us {
		1
	} else {
		-1
	}
}

struct Agent {
	memory: Memory,
	lags: usize,
}

impl Agent {
	fn new(seed: u64, lags: usize) -> Result<Self> {
		let mut memory = Memory::with_seed(seed);
		memory.set_temperature(Some(1.0))?;
		Ok(Self { memory, lags })
	}

	fn situation(&self, history: &[(String, String)]) -> Slots {
		let mut slots = Slots::new();
		for lag in 1..=self.lags {
			let observed = history
				.len()
				.checked_sub(lag)
				.map(|i| history[i].1.clone());
			slots.set(format!("lag{lag}"), Value::from(observed));
		}
		slots
	}

	fn choose(&mut self, history: &[(String, String)]) -> Result<&'static str> {
		let conditions = self.situation(history);
		let predicted = self
			.memory
			.discrete_blend("next", &conditions)?
			.map(|(winner, _)| winner);
		Ok(match predicted {
			Some(Value::Str(s)) => beats(&s),
			_ => MOVES[self.memory.time() as usize % 3],
		})
	}

	fn observe(&mut self, history: &[(String, String)], opponent_move: &str) -> Result<()> {
		let mut observation = self.situation(history);
		observation.set("next", opponent_move);
		self.memory.learn_and_advance(observation, Advance::Unit)?;
		Ok(())
	}
}

fn main() -> Result<()> {
	let mut shallow = Agent::new(1, 1)?;
	let mut deep = Agent::new(2, 2)?;

	let mut history: Vec<(String, String)> = Vec::new();
	let mut totals = (0i32, 0i32);
	for round in 0..ROUNDS {
		let shallow_move = shallow.choose(&history)?;
		// the deep agent sees history with roles swapped
		let swapped: Vec<(String, String)> =
			history.iter().map(|(a, b)| (b.clone(), a.clone())).collect();
		let deep_move = deep.choose(&swapped)?;

		totals.0 += score(shallow_move, deep_move);
		totals.1 += score(deep_move, shallow_move);

		shallow.observe(&history, deep_move)?;
		deep.observe(&swapped, shallow_move)?;
		history.push((shallow_move.to_owned(), deep_move.to_owned()));

		if (round + 1) % 50 == 0 {
			println!(
				"after {:>3} rounds: lag-1 score {:>4}, lag-2 score {:>4}",
				round + 1,
				totals.0,
				totals.1
			);
		}
	}
	Ok(())
}
