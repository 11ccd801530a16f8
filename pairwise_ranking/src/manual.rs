/*!

This is the long-form manual for `pairwise_ranking` and `jamvote`.

## How the ranking works

Every voter submits one ballot: an ordered list of the entries they liked, the
most preferred first. Ballots may be partial. The ranking compares every pair
of entries head to head:

- for the pair (A, B), a ballot votes for A if it places A before B, and for B
  if it places B before A;
- the entry with more votes wins the pairing. If both received the same number
  of votes (including no votes at all), nobody wins it;
- each entry gets one point per pairing won. The entries are then grouped by
  points, in decreasing order. Entries with the same number of points share the
  same rank.

With no ballots at all, every entry is tied at rank 1. With no entries, the
ranking is empty.

Note that a split pairing gives nothing to either side. It is possible for an
entry with a larger overall share of the votes to end up tied with others.

### Rules

`tiebreakMode`
 - `useCandidateOrder` (default) tied entries are listed in the order of the
   jam file.
 - `candidateName` tied entries are listed alphabetically.

The order inside a tie has no meaning for the ranking itself.

`partialBallots`
 - `requireBoth` (default) a ballot only counts for the pair (A, B) if it ranks
   both A and B.
 - `rankedOverUnranked` an entry that is ranked on a ballot is preferred to an
   entry that is missing from it.

## The jam file

`jamvote` keeps the state of the current jam in a single JSON file:

```text
{
  "uuid": "8a0b...",
  "name": "Spring Jam",
  "rules": { "tiebreakMode": "useCandidateOrder", "partialBallots": "requireBoth" },
  "outputSettings": { "outputDirectory": "out", "archiveDirectory": "archive" },
  "teams": [
    { "uuid": "t1", "name": "Space Goats" },
    { "uuid": "t2", "name": "Dungeon Bakery", "withdrawn": true }
  ],
  "votes": [
    {
      "clientId": "c1",
      "timestamp": "2024-03-02T18:00:00Z",
      "choices": [ { "team": "t2", "rank": 0 }, { "team": "t1", "rank": 1 } ],
      "voterStatus": "participant",
      "discovery": "friend"
    }
  ]
}
```

`rules` and `outputSettings` are optional. Directories are relative to the
location of the jam file.

A withdrawn team is left out of the standings. The votes that mention it are
kept, and the rest of those votes still count.

## Commands

```bash
jamvote --config jam.json standings --out stdout
jamvote --config jam.json vote --client c1 --timestamp 2024-03-02T18:00:00Z --choices t2,t1
jamvote --config jam.json withdraw --team t2
jamvote --config jam.json votes
jamvote --config jam.json archive
jamvote --config jam.json archives --id 8a0b...
```

`standings --reference expected.json` compares the summary with a reference
file and fails if they differ.

`archive` saves the teams, the votes and the standings to
`gamejam_<uuid>.json` in the archive directory, then clears the current jam
(use `--keep` to leave it untouched). Archived standings are never recomputed,
even if a team is withdrawn later.

 */
