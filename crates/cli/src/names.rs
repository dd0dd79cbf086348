//! Display names for simulated participants.

use rand::seq::SliceRandom;

const FIRST: &[&str] = &[
	"Ada", "Alex", "Amara", "Ben", "Carmen", "Dana", "Elena", "Felix", "Grace", "Hugo", "Imani",
	"Jonas", "Kira", "Liam", "Mara", "Noel", "Olive", "Priya", "Quinn", "Rosa", "Sam", "Tessa",
	"Umar", "Vera", "Wes", "Yara", "Zoe",
];

const LAST: &[&str] = &[
	"Adler", "Banks", "Castillo", "Dietrich", "Egan", "Ferrara", "Grant", "Holt", "Ibrahim",
	"Jensen", "Kovacs", "Laurent", "Mercer", "Novak", "Okafor", "Petrov", "Quigley", "Reyes",
	"Silva", "Tanaka", "Ueda", "Vance", "Whitfield", "Young", "Zhang",
];

/// Picks a random plausible full name.
pub fn full_name() -> String {
	let mut rng = rand::thread_rng();
	let first = FIRST.choose(&mut rng).copied().unwrap_or("Alex");
	let last = LAST.choose(&mut rng).copied().unwrap_or("Reyes");
	format!("{first} {last}")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn full_name_is_first_and_last() {
		let name = full_name();
		let parts: Vec<&str> = name.split(' ').collect();
		assert_eq!(parts.len(), 2);
		assert!(FIRST.contains(&parts[0]));
		assert!(LAST.contains(&parts[1]));
	}
}
