mod accounts;
mod games;
mod leaderboard;
mod loans;
mod pools;
