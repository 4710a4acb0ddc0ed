mod test_app_flow;
mod test_workout_completion;
