mod consent_prompt;
