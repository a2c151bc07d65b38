//! Text the dialogs send

pub const GREETING: &str =
    "What can I help you with today?\n You can start by telling me how are you feeling.";
pub const RESTART: &str = "What else can I do for you?";
pub const LUIS_NOT_CONFIGURED: &str = "NOTE: LUIS is not configured. To enable all capabilities, add `LuisAppId`, `LuisAPIKey` and `LuisAPIHostName` to the .env file.";

pub const DEPRESSION: &str =
    "Speaking to a therapist works best when there are early signs of depression.";
pub const SELF_HARM_FALSE: &str = "That is a good sign towards a better mental health moving ahead. Tell me more about yourself.";
pub const SELF_HARM_TRUE: &str = "You should immediately talk it out with a registered therapist. Servian offers its employees a totally anonymous service to discuss about work-life balance.";
pub const NONE_INTENT: &str = "I am not sure if I can help with that.";
pub const WEATHER: &str = "I can't check the weather yet, but I can book a flight for you.";

pub const ASK_DESTINATION: &str = "To what city would you like to travel?";
pub const ASK_ORIGIN: &str = "From what city will you be travelling?";
pub const ASK_TRAVEL_DATE: &str = "On what date would you like to travel?";
pub const REPROMPT_TRAVEL_DATE: &str =
    "I'm sorry, for best results, please enter your travel date including the month, day and year.";
pub const TRAVEL_DATE_GAVE_UP: &str =
    "I'm sorry, I still couldn't work out your travel date, so I've cancelled this booking.";
pub const REPROMPT_CONFIRM: &str = "Please answer yes or no.";

pub const HELP: &str = "I can book a flight for you: tell me where you're flying to, where from and on which date. Say \"cancel\" at any time to stop.";
pub const CANCELLING: &str = "Cancelling...";

pub fn didnt_understand(label: &str) -> String {
    format!(
        "Sorry, I didn't get that. Please try asking in a different way (intent was {})",
        label
    )
}

pub fn unsupported_airports(cities: &[String]) -> String {
    format!(
        "Sorry but the following airports are not supported: {}",
        cities.join(", ")
    )
}

pub fn confirm_booking(destination: &str, origin: &str, travel_date: &str) -> String {
    format!(
        "Please confirm, I have you traveling to: {} from: {} on: {}. Is this correct?",
        destination, origin, travel_date
    )
}

pub fn booked(destination: &str, origin: &str, travel_date: &str) -> String {
    format!(
        "I have you booked to {} from {} on {}.",
        destination, origin, travel_date
    )
}
