use std::fmt::Display;

use observable::{NotifyError, Observable};

struct Person {
    first: Observable<String>,
    last: Observable<String>,
    cgpa: Observable<f64>,
    college: String,
}

impl Person {
    fn new(first: &str, last: &str, cgpa: f64, college: &str) -> Self {
        Self {
            first: Observable::new(first.to_string()),
            last: Observable::new(last.to_string()),
            cgpa: Observable::new(cgpa),
            college: college.to_string(),
        }
    }
}

fn main() -> Result<(), NotifyError> {
    let person = Person::new("Shahzad", "Majeed", 3.1, "FAST");

    // The same function can listen to differently typed values.
    person.first.subscribe(print_new_value::<String>);
    person.last.subscribe(print_new_value::<String>);
    person.cgpa.subscribe(|old_value: &f64, new_value: &f64| {
        println!("{old_value} updated to {new_value}");
    });

    // Each write prints a line before returning. Writing the same last name
    // still notifies.
    person.first.set(String::from("Abbass"))?;
    person.last.set(String::from("Majeed"))?;
    person.cgpa.set(4.0)?;

    println!(
        "{} {} of {} has a CGPA of {}",
        *person.first.read(),
        *person.last.read(),
        person.college,
        person.cgpa.get()
    );
    Ok(())
}

fn print_new_value<T: Display>(old_value: &T, new_value: &T) {
    println!("{old_value} updated to {new_value}");
}

#[test]
fn runs() {
    main().unwrap();
}
