use keymap::KeyMap;

#[derive(KeyMap, Clone, Copy, Debug, PartialEq)]
pub enum Action {
    /// Quit the application
    #[key("q")]
    Quit,
    /// Commit the rules and restart from the initial tape
    #[key("r")]
    Restart,
    /// Reset the tape and state, keeping the current rules
    #[key("e")]
    Reset,
    /// Advance the machine by one step
    #[key("space")]
    Step,
    /// Start or stop continuous running
    #[key("p")]
    ToggleRun,
    /// Decrement the step counter
    #[key("b")]
    Back,
    /// Move the head one cell left
    #[key("a")]
    HeadLeft,
    /// Move the head one cell right
    #[key("d")]
    HeadRight,
    /// Run faster
    #[key("up")]
    Faster,
    /// Run slower
    #[key("down")]
    Slower,
    /// Cycle the fill policy
    #[key("f")]
    CycleFill,
    /// Load a random initial tape
    #[key("x")]
    RandomTape,
    /// Edit the rule table
    #[key("i")]
    EditRules,
    /// Type an initial tape to import
    #[key("t")]
    ImportTape,
    /// Save the tape dump
    #[key("s")]
    Save,
    /// Toggle help display
    #[key("h")]
    ToggleHelp,
    /// Load the previous program
    #[key("left")]
    PreviousProgram,
    /// Load the next program
    #[key("right")]
    NextProgram,
}
